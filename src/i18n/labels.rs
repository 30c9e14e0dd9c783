use chrono::Weekday;

pub(super) fn lookup(key: &str, lang: &str) -> Option<&'static str> {
    let v = match (key, lang) {
        ("today", "Portuguese") => "Hoje",
        ("today", _) => "Today",
        ("yesterday", "Portuguese") => "Ontem",
        ("yesterday", _) => "Yesterday",
        ("image_placeholder", "Portuguese") => "[Imagem]",
        ("image_placeholder", _) => "[Image]",
        ("media_placeholder", "Portuguese") => "[M\u{00ed}dia]",
        ("media_placeholder", _) => "[Media]",
        _ => return None,
    };
    Some(v)
}

/// Full weekday name in `lang`.
pub fn weekday_name(day: Weekday, lang: &str) -> &'static str {
    match lang {
        "Portuguese" => match day {
            Weekday::Mon => "segunda-feira",
            Weekday::Tue => "ter\u{00e7}a-feira",
            Weekday::Wed => "quarta-feira",
            Weekday::Thu => "quinta-feira",
            Weekday::Fri => "sexta-feira",
            Weekday::Sat => "s\u{00e1}bado",
            Weekday::Sun => "domingo",
        },
        _ => match day {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        },
    }
}
