//! Keyword-based currency tagging.
//!
//! Text is NFKC-normalized and lowercased before matching, so full-width
//! and half-width spellings and letter case all hit the same keywords.
//! Keyword lists are stored already normalized.

use crate::types::CurrencyTag;
use unicode_normalization::UnicodeNormalization;

const USD_KEYWORDS: &[&str] = &[
    // currency
    "usd", "us dollar", "dollar", "greenback", "米ドル", "ドル", "米国ドル",
    // institutions and policy
    "federal reserve", "fed", "frb", "米連邦準備制度理事会", "米連銀", "フェデラルリザーブ",
    "fomc", "米金融政策", "米利上げ", "米利下げ", "金利決定", "政策金利",
    "trump", "president", "米大統領", "トランプ大統領", "トランプ",
    "jerome powell", "パウエル", "frb議長", "federal funds rate",
    "federal open market committee", "連邦公開市場委員会",
    // indicators
    "gdp", "米国gdp", "米gdp", "アメリカgdp", "国内総生産",
    "cpi", "米国cpi", "米cpi", "消費者物価指数", "インフレ", "物価上昇",
    "pce", "personal consumption expenditures", "個人消費支出",
    "ppi", "米国ppi", "米ppi", "生産者物価指数",
    "employment", "unemployment", "米国雇用統計", "米雇用統計", "失業率", "雇用者数",
    "nonfarm payrolls", "nfp", "非農業部門雇用者数", "雇用統計",
    "retail sales", "米国小売売上高", "米小売売上高", "小売売上",
    "durable goods orders", "耐久財受注",
    "ism manufacturing", "ism non-manufacturing", "ism製造業景況指数", "ism非製造業景況指数",
    "housing market", "住宅市場", "住宅着工件数", "住宅販売",
    "consumer confidence", "消費者信頼感指数", "消費者心理",
    "trade balance", "trade deficit", "貿易収支", "貿易赤字",
    "public debt", "sovereign debt", "財政赤字", "政府債務",
    "treasury", "米国債", "米債", "国債利回り", "10年債",
    "yield", "利回り", "債券利回り", "米国株",
    // countries and places
    "united states", "america", "usa", "米国", "アメリカ", "米",
    "washington", "ワシントン", "new york", "ニューヨーク",
    // pairs
    "usd/jpy", "usdjpy", "ドル円", "ドル/円", "dollar yen",
    "eur/usd", "eurusd", "ユーロドル", "ユーロ/ドル", "euro dollar",
];

const EUR_KEYWORDS: &[&str] = &[
    // currency
    "eur", "euro", "ユーロ", "欧州通貨", "欧州共通通貨",
    // institutions and policy
    "european central bank", "ecb", "欧州中央銀行", "欧州中銀", "ヨーロッパ中央銀行",
    "christine lagarde", "lagarde", "ラガルド", "ecb政策決定", "欧州金融政策",
    "欧州利上げ", "欧州利下げ", "ユーロ圏金利", "deposit facility rate",
    // indicators
    "eurozone gdp", "ユーロ圏gdp", "欧州gdp", "欧州経済成長",
    "eurozone cpi", "ユーロ圏cpi", "欧州cpi", "欧州インフレ", "欧州物価",
    "eurozone ppi", "ユーロ圏ppi", "欧州ppi",
    "eurozone pmi", "ユーロ圏pmi", "欧州pmi",
    "zew economic sentiment", "zew景況感指数",
    "eurozone unemployment", "ユーロ圏失業率", "欧州失業率",
    "eurozone retail sales", "ユーロ圏小売売上高", "欧州小売売上",
    "german gdp", "ドイツgdp", "独gdp", "ドイツ経済",
    "french gdp", "フランスgdp", "仏gdp", "フランス経済",
    // countries and places
    "eurozone", "ユーロ圏", "ユーロ域", "欧州", "ヨーロッパ",
    "germany", "ドイツ", "berlin", "ベルリン", "ドイツ株",
    "france", "フランス", "paris", "パリ", "フランス株",
    "italy", "イタリア", "spain", "スペイン",
    "netherlands", "オランダ", "belgium", "ベルギー",
    // pairs
    "eur/usd", "eurusd", "ユーロドル", "ユーロ/ドル", "euro dollar",
    "eur/jpy", "eurjpy", "ユーロ円", "ユーロ/円", "euro yen",
];

const JPY_KEYWORDS: &[&str] = &[
    // currency
    "jpy", "japanese yen", "yen", "日本円", "円", "円相場", "円安", "円高",
    // institutions and policy
    "bank of japan", "boj", "日本銀行", "日銀", "ボージェイ",
    "黒田東彦", "植田和男", "日銀総裁", "金融政策決定会合", "政策決定会合",
    "日本金融政策", "日銀政策", "金融緩和", "量的緩和", "為替介入",
    "マイナス金利", "イールドカーブコントロール", "ycc",
    // indicators
    "japan gdp", "日本gdp", "日本経済成長",
    "japan cpi", "日本cpi", "コア指数",
    "japan ppi", "日本ppi", "企業物価指数",
    "japan pmi", "日本pmi",
    "japan unemployment", "日本失業率", "完全失業率",
    "japan retail sales", "日本小売売上高", "小売業販売額",
    "balance of payments", "国際収支", "貿易黒字",
    "current account", "経常収支", "経常黒字", "経常赤字",
    "tankan", "短観", "日銀短観", "企業短期経済観測調査",
    "machinery orders", "機械受注",
    "鉱工業生産指数", "外貨準備高", "foreign exchange reserves",
    // countries and places
    "japan", "日本", "nippon", "nihon",
    "tokyo", "東京", "osaka", "大阪", "yokohama", "横浜",
    // pairs
    "usd/jpy", "usdjpy", "ドル円", "ドル/円", "dollar yen",
    "eur/jpy", "eurjpy", "ユーロ円", "ユーロ/円", "euro yen",
];

fn keywords(tag: CurrencyTag) -> &'static [&'static str] {
    match tag {
        CurrencyTag::Usd => USD_KEYWORDS,
        CurrencyTag::Eur => EUR_KEYWORDS,
        CurrencyTag::Jpy => JPY_KEYWORDS,
    }
}

/// NFKC then lowercase.
pub fn normalize(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

/// Currencies mentioned in `text`, in USD, EUR, JPY order.
pub fn detect_tags(text: &str) -> Vec<CurrencyTag> {
    let normalized = normalize(text);

    CurrencyTag::ALL
        .into_iter()
        .filter(|tag| keywords(*tag).iter().any(|kw| normalized.contains(kw)))
        .collect()
}
