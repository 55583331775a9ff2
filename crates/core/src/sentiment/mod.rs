//! Simulated news sentiment. No articles are fetched: either a fixed set of
//! pre-scored headlines or templated headlines run through [`lexicon::polarity`].

pub mod lexicon;

use crate::round2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Per-article label; zero is neutral.
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            SentimentLabel::Positive
        } else if score < 0.0 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentSource {
    #[default]
    Canned,
    Lexical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub sentiment: SentimentLabel,
    pub score: f64,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    pub overall_sentiment: SentimentLabel,
    pub sentiment_score: f64,
    pub news_articles: Vec<Article>,
    pub news_count: usize,
}

impl SentimentReport {
    /// Overall label is positive only when the mean score is strictly above zero.
    pub fn from_articles(news_articles: Vec<Article>) -> Self {
        let mean = if news_articles.is_empty() {
            0.0
        } else {
            news_articles.iter().map(|a| a.score).sum::<f64>() / news_articles.len() as f64
        };

        Self {
            overall_sentiment: if mean > 0.0 {
                SentimentLabel::Positive
            } else {
                SentimentLabel::Negative
            },
            sentiment_score: round2(mean),
            news_count: news_articles.len(),
            news_articles,
        }
    }
}

pub fn report(symbol: &str, source: SentimentSource) -> SentimentReport {
    match source {
        SentimentSource::Canned => canned_report(symbol),
        SentimentSource::Lexical => lexical_report(symbol),
    }
}

/// Same three pre-scored headlines for every symbol.
pub fn canned_report(symbol: &str) -> SentimentReport {
    let article = |title: String, sentiment, score, source: &str| Article {
        title,
        sentiment,
        score,
        source: source.to_string(),
    };

    SentimentReport::from_articles(vec![
        article(
            format!("{symbol} Reports Strong Quarterly Earnings"),
            SentimentLabel::Positive,
            0.8,
            "Financial Times",
        ),
        article(
            format!("{symbol} Stock Sees Bullish Momentum"),
            SentimentLabel::Positive,
            0.75,
            "Reuters",
        ),
        article(
            format!("Market Concerns Affect {symbol} Performance"),
            SentimentLabel::Negative,
            -0.6,
            "Bloomberg",
        ),
    ])
}

const LEXICAL_SOURCE: &str = "Financial News API";

fn templated_headlines(symbol: &str) -> [String; 5] {
    [
        format!("{symbol} reports strong quarterly earnings, beating expectations"),
        format!("Analysts upgrade {symbol} stock rating amid growth prospects"),
        format!("Market volatility affects {symbol} performance in recent trading"),
        format!("{symbol} announces new product lineup for upcoming quarter"),
        format!("Supply chain concerns impact {symbol} production forecasts"),
    ]
}

/// Five templated headlines scored by the lexical polarity scorer.
pub fn lexical_report(symbol: &str) -> SentimentReport {
    let articles = templated_headlines(symbol)
        .into_iter()
        .map(|title| {
            let score = round2(lexicon::polarity(&title));
            Article {
                sentiment: SentimentLabel::from_score(score),
                score,
                title,
                source: LEXICAL_SOURCE.to_string(),
            }
        })
        .collect();

    SentimentReport::from_articles(articles)
}
