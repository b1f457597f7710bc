use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::group::{Block, Entry, Fragment};

const FONTS_HREF: &str = "https://fonts.googleapis.com/css?family=Exo+2:300,400,700";

pub fn render_entries(entries: &[Entry]) -> String {
    entries
        .iter()
        .map(|entry| match entry {
            Entry::DayMarker(date) => format!("\n<div class=\"dateheader\">{date}</div>\n"),
            Entry::Block(block) => render_block(block),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_block(block: &Block) -> String {
    let messages = block
        .fragments
        .iter()
        .map(render_fragment)
        .collect::<Vec<_>>()
        .join("\n");

    let mut output = String::new();
    output.push_str("\n<div class=\"messageblock\">\n");
    output.push_str("  <div class=\"avatarpanel\">\n");
    output.push_str(&format!(
        "    <img class=\"avatar\" src=\"{}\">\n",
        encode_double_quoted_attribute(&block.author.avatar)
    ));
    output.push_str("  </div>\n");
    output.push_str("  <div class=\"messagepanel\">\n");
    output.push_str("    <div class=\"messageheader\">\n");
    output.push_str(&format!(
        "      <span class=\"username\">{}</span>\n",
        encode_text(&block.author.name)
    ));
    output.push_str(&format!(
        "      <span class=\"timestamp\">{}</span>\n",
        encode_text(&block.started_at.clock_seconds())
    ));
    output.push_str("    </div>\n");
    output.push_str(&format!("    {messages}\n"));
    output.push_str("  </div>\n");
    output.push_str("</div>\n");
    output
}

fn render_fragment(fragment: &Fragment) -> String {
    match fragment {
        Fragment::Text { posted_at, html } => message(&posted_at.clock(), "message-body", html),
        Fragment::Image {
            posted_at,
            path,
            alt,
        } => message(
            &posted_at.clock(),
            "message-body image-container",
            &inline_image(path, path, alt, ""),
        ),
        Fragment::Attachment {
            posted_at,
            path,
            thumbnail,
            title,
            filetype,
        } => {
            let notes = format!(
                "<i>{} &ndash; {} attachment:</i> ",
                encode_text(title),
                encode_text(&filetype.to_uppercase())
            );
            message(
                &posted_at.clock(),
                "message-body image-container",
                &inline_image(path, thumbnail, title, &notes),
            )
        }
    }
}

fn message(timestamp: &str, body_class: &str, body: &str) -> String {
    format!(
        "\n    <div class=\"message\">\n      <div class=\"message-timestamp\">{}</div>\n      <div class=\"{body_class}\">{body}</div>\n    </div>\n",
        encode_text(timestamp)
    )
}

fn inline_image(target: &str, image: &str, alt: &str, notes: &str) -> String {
    format!(
        "<a href=\"{}\">{notes}<img class=\"inlineimage\" src=\"{}\" alt=\"{}\"></a>",
        encode_double_quoted_attribute(target),
        encode_double_quoted_attribute(image),
        encode_double_quoted_attribute(alt)
    )
}

pub fn render_page(title: &str, stylesheet: &str, content: &str) -> String {
    let title = encode_text(title);
    let mut output = String::new();
    output.push_str("\n<!DOCTYPE html>\n<html>\n<head>\n");
    output.push_str(&format!("  <title>{title}</title>\n"));
    output.push_str(&format!(
        "  <link rel=\"stylesheet\" href=\"{}\">\n",
        encode_double_quoted_attribute(stylesheet)
    ));
    output.push_str(&format!(
        "  <link href=\"{FONTS_HREF}\" rel=\"stylesheet\" type=\"text/css\">\n"
    ));
    output.push_str("  <meta charset=\"utf-8\">\n");
    output.push_str("</head>\n<body>\n");
    output.push_str(&format!("<h1>{title}</h1>\n"));
    output.push_str(content);
    output.push_str("\n</body></html>\n");
    output
}
