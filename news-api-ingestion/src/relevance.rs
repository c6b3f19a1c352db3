use interfaces::ApiNewsItem;

// Publishers whose general feed is dominated by USD/EUR/JPY market coverage.
const SOURCES: &[&str] = &[
    // USD
    "cnbc", "bloomberg", "reuters", "wall street journal", "marketwatch", "forexlive",
    "yahoo finance", "business insider", "forbes", "ny times", "fox business", "cnn",
    "barron's", "motley fool", "seeking alpha", "us treasury", "federal reserve", "wsj",
    "usa today", "thestreet", "investopedia", "kiplinger", "morningstar", "s&p global",
    "nasdaq", "zacks", "the economist", "politico", "fortune", "us news", "abc news",
    "cbs news", "nbc news", "npr",
    // EUR
    "financial times", "handelsblatt", "le monde", "ecb", "the guardian", "bbc", "el país",
    "il sole 24 ore", "les echos", "frankfurter allgemeine", "euronews", "swissinfo",
    "süddeutsche zeitung", "la stampa", "la repubblica", "die welt", "le figaro",
    "der spiegel", "irish times", "the times", "the telegraph", "sky news",
    // JPY
    "nikkei", "nhk", "日経", "朝日新聞", "読売新聞", "日本経済新聞", "boj", "毎日新聞",
    "共同通信", "東洋経済", "産経新聞", "時事通信", "yahoo!ニュース",
];

const COUNTRIES: &[&str] = &[
    "united states", "america", "米国", "usa",
    "europe", "eurozone", "germany", "france", "欧州", "ユーロ圏", "ドイツ", "フランス",
    "japan", "日本", "tokyo", "東京",
];

const CURRENCY_KEYWORDS: &[&str] = &[
    "usd", "us dollar", "dollar", "米ドル", "ドル", "greenback",
    "eur", "euro", "ユーロ", "欧州通貨",
    "jpy", "japanese yen", "yen", "日本円", "円",
    "bank of japan", "boj", "日銀", "日本銀行",
    "federal reserve", "frb", "fed", "米連邦準備制度理事会",
    "european central bank", "ecb", "欧州中央銀行",
    "forex", "foreign exchange", "為替", "為替相場", "fomc", "金融政策",
];

/// Whether an API item is worth ingesting as FX news.
///
/// Matches the publisher name first, then country names and currency
/// keywords in headline, summary and url. Case-insensitive.
pub fn is_currency_related(item: &ApiNewsItem) -> bool {
    let source = item.source.to_lowercase();
    if SOURCES.iter().any(|s| source.contains(s)) {
        return true;
    }

    let text = format!("{} {} {}", item.headline, item.summary, item.url).to_lowercase();
    COUNTRIES.iter().any(|c| text.contains(c)) || CURRENCY_KEYWORDS.iter().any(|k| text.contains(k))
}
