use crate::charts::{Chart, ChartSet};
use crate::model::Analysis;
use std::fmt::Write;
use time::OffsetDateTime;

const STYLE: &str = "body{margin:0;font-family:sans-serif;background:#191414;color:#FFFFFF}\
main{max-width:1100px;margin:0 auto;padding:24px}\
h1{color:#1DB954}\
.cards{display:flex;flex-wrap:wrap;gap:16px;margin-bottom:32px}\
.card{flex:1 1 180px;background:#282828;border-radius:8px;padding:16px}\
.card span{display:block;color:#B3B3B3;font-size:.85em}\
.card strong{font-size:1.4em}\
figure{background:#282828;border-radius:8px;padding:16px;margin:0 0 24px}\
figure img{width:100%;height:auto;background:#FFFFFF;border-radius:4px}\
table{border-collapse:collapse;width:100%;margin-top:8px}\
td{padding:2px 8px;border-bottom:1px solid #333}\
td.value{text-align:right}\
.swatch{display:inline-block;width:12px;height:12px;margin-right:6px;border:1px solid #535353}\
button{background:#1DB954;color:#FFFFFF;border:0;border-radius:24px;padding:12px 32px;font-size:1em;cursor:pointer}\
footer{color:#535353;text-align:center;padding:24px}";

/// Formats with `,` thousands separators: `1234567` becomes `1,234,567`.
pub fn format_number(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub fn current_year() -> i32 {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .year()
}

pub fn index_page() -> String {
    layout(
        "Your Music Wrapped",
        "<h1>Your Music Wrapped</h1>\
         <p>See your most played songs, artists and genres.</p>\
         <form method=\"post\" action=\"/analyze\"><button type=\"submit\">Analyze my listening</button></form>",
        current_year(),
    )
}

pub fn error_page(message: &str) -> String {
    let body = format!(
        "<h1>Nothing to analyze</h1><p>{}</p><p><a href=\"/\">Back</a></p>",
        escape_html(message)
    );
    layout("Nothing to analyze", &body, current_year())
}

pub fn results_page(analysis: &Analysis, charts: &ChartSet, year: i32) -> String {
    let summary = &analysis.summary;
    let top_song = format!(
        "{} by {} ({} plays)",
        summary.top_song.song_name,
        summary.top_song.artist,
        format_number(summary.top_song.play_count)
    );

    let mut body = String::from("<h1>Your Music Wrapped</h1><section class=\"cards\">");
    for (label, value) in [
        ("Total plays", format_number(summary.total_plays)),
        ("Songs", format_number(summary.total_songs as u64)),
        ("Top song", top_song),
        ("Top artist", summary.top_artist.clone()),
        ("Top genre", summary.top_genre.clone()),
    ] {
        let _ = write!(
            body,
            "<div class=\"card\"><span>{label}</span><strong>{}</strong></div>",
            escape_html(&value)
        );
    }
    body.push_str("</section>");

    for chart in charts.iter() {
        push_chart(&mut body, chart);
    }
    body.push_str("<p><a href=\"/\">Back</a></p>");

    layout("Your Music Wrapped", &body, year)
}

fn push_chart(body: &mut String, chart: &Chart) {
    let _ = write!(
        body,
        "<figure><figcaption><h2>{title}</h2></figcaption>\
         <img alt=\"{title}\" src=\"data:image/png;base64,{png}\">",
        title = escape_html(chart.title),
        png = chart.png_base64,
    );
    if !chart.x_label.is_empty() || !chart.y_label.is_empty() {
        let axes = [chart.x_label, chart.y_label]
            .into_iter()
            .filter(|label| !label.is_empty())
            .collect::<Vec<_>>()
            .join(" / ");
        let _ = write!(body, "<p>{}</p>", escape_html(&axes));
    }

    body.push_str("<table>");
    for entry in &chart.legend {
        let swatch = entry
            .color
            .as_deref()
            .map(|color| format!("<i class=\"swatch\" style=\"background:{color}\"></i>"))
            .unwrap_or_default();
        let _ = write!(
            body,
            "<tr><td>{swatch}{}</td><td class=\"value\">{}</td></tr>",
            escape_html(&entry.label),
            escape_html(&entry.value)
        );
    }
    body.push_str("</table></figure>");
}

fn layout(title: &str, body: &str, year: i32) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{}</title><style>{STYLE}</style></head>\
         <body><main>{body}</main><footer>&copy; {year} Music Wrapped</footer></body></html>",
        escape_html(title)
    )
}
