//! HTML Pages

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::files::{EntryKind, ListingDescriptor};

const LOGIN_PAGE: &str = concat!(
    "<!DOCTYPE html>\n",
    "<html><head><meta charset=\"utf-8\"><title>Sign in</title></head><body>",
    "<form action=\"/login\" method=\"post\">",
    "Name: <input type=\"text\" name=\"name\" autofocus>",
    "<input type=\"submit\" value=\"Sign in\">",
    "</form></body></html>\n",
);

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
ul{list-style:none;padding:0}li{padding:.15em 0}\
a{text-decoration:none}a:hover{text-decoration:underline}\
form{margin-top:1.5em}";

/// Percent-encoded absolute URL path for a root relative path.
pub fn href(relative: &str) -> String {
    let encoded: Vec<_> = relative
        .split('/')
        .filter(|s| !s.is_empty())
        .map(urlencoding::encode)
        .collect();
    format!("/{}", encoded.join("/"))
}

#[inline]
fn child(parent: &str, name: &str) -> String {
    match parent.is_empty() {
        true => name.to_owned(),
        false => format!("{parent}/{name}"),
    }
}

/// Static login form.
#[inline]
pub fn login_page() -> &'static str {
    LOGIN_PAGE
}

/// Directory listing page with an upload form for the listed directory.
pub fn listing_page(listing: &ListingDescriptor) -> String {
    let title = encode_text(&listing.display_path()).into_owned();

    let mut items = String::new();
    if let Some(parent) = listing.parent_path() {
        items.push_str(&format!(
            "<li><a href=\"{}\">../</a></li>\n",
            encode_double_quoted_attribute(&href(parent))
        ));
    }
    for entry in listing.entries.iter() {
        let suffix = match entry.kind {
            EntryKind::Directory => "/",
            EntryKind::File => "",
        };
        let link = href(&child(&listing.current_path, &entry.name));
        items.push_str(&format!(
            "<li><a href=\"{}\">{}{suffix}</a></li>\n",
            encode_double_quoted_attribute(&link),
            encode_text(&entry.name),
        ));
    }

    let action = format!("/upload{}", href(&listing.current_path));
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\
<title>Index of {title}</title><style>{STYLE}</style></head>\n<body>\n\
<h1>Index of {title}</h1>\n<ul>\n{items}</ul>\n\
<form action=\"{}\" method=\"post\" enctype=\"multipart/form-data\">\
<input type=\"file\" name=\"file\" multiple> <input type=\"submit\" value=\"Upload\">\
</form>\n</body></html>\n",
        encode_double_quoted_attribute(&action),
    )
}
