//! The one-page HTML form.

/// Render the form, optionally with the previous query and its answer.
pub fn render(query: Option<&str>, answer: Option<&str>) -> String {
    let result = answer
        .map(|answer| {
            format!(
                "<section class=\"answer\"><h2>Answer</h2><p>{}</p></section>",
                escape(answer).replace('\n', "<br>")
            )
        })
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>askdesk</title>
<style>
body {{ font-family: sans-serif; max-width: 40rem; margin: 2rem auto; }}
input[type=text] {{ width: 100%; padding: .5rem; }}
.answer {{ margin-top: 1.5rem; padding: 1rem; background: #f4f4f4; }}
</style>
</head>
<body>
<h1>Ask a question</h1>
<form method="post" action="/ask">
<input type="text" name="query" value="{query}" placeholder="e.g. what is 7 * 8?" autofocus>
<button type="submit">Ask</button>
</form>
{result}
</body>
</html>
"#,
        query = escape(query.unwrap_or_default()),
    )
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
