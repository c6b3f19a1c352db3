pub mod defs;

pub use defs::{ApiNewsItem, Article, CurrencyTag, NewArticle, NewsApi, TimeWindow};
