// References:
// 1. https://github.com/clitic/vsd/blob/30ca1985e4a467ea3304b11c08d3176deaafd22a/vsd/src/dash/template.rs
// 2. https://github.com/emarsden/dash-mpd-rs/blob/6ebdfb4759adbda8233b5b3520804e23ff86e7de/src/fetch.rs#L435-L466

use regex::Regex;
use std::{collections::HashMap, sync::LazyLock};

use crate::error::{MpdError, MpdResult};

// From https://dashif.org/docs/DASH-IF-IOP-v4.3.pdf:
// "For the avoidance of doubt, only %0[width]d is permitted and no other identifiers. The reason
// is that such a string replacement can be easily implemented without requiring a specific library."
//
// Instead of pulling in C printf() or a reimplementation such as the printf_compat crate, we reimplement
// this functionality directly. Every value is a u64, so $Time$ needs no separate 64-bit formatter.
//
// Example template: "$RepresentationID$/$Number%06d$.m4s"
static NUMERIC_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^%(0\d*)d([^%$]*)$").unwrap());

/// Widest `%0[width]d` padding accepted.
const MAX_WIDTH: usize = 255;

/// Characters allowed in `$RepresentationID$` substitutions, see RFC 1738.
const RFC1738_SAFE: &str =
    ";:@&=abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789$-_.+!*'(),%/";

/// Whether `format` is a `%0[width]d` specifier accepted after `$Number`, `$Bandwidth` or `$Time`.
pub fn validate_numeric_format(format: &str) -> bool {
    NUMERIC_FORMAT.is_match(format)
}

/// Whether `s` only contains characters RFC 1738 allows in a URL, with well-formed `%XX` escapes.
pub fn validate_rfc1738_url(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if !RFC1738_SAFE.as_bytes().contains(&c) {
            return false;
        }
        if c == b'%' {
            let escaped = bytes.get(i + 1..i + 3);
            if !escaped.is_some_and(|e| e.iter().all(u8::is_ascii_hexdigit)) {
                return false;
            }
            i += 2;
        }
        i += 1;
    }
    true
}

#[derive(Debug, Default, Clone)]
pub struct Template {
    args: HashMap<&'static str, String>,
}

impl Template {
    pub const REPRESENTATION_ID: &'static str = "RepresentationID";
    pub const NUMBER: &'static str = "Number";
    pub const TIME: &'static str = "Time";
    pub const BANDWIDTH: &'static str = "Bandwidth";

    pub fn new() -> Self {
        Self {
            args: HashMap::with_capacity(4),
        }
    }

    pub fn insert(&mut self, key: &'static str, value: impl ToString) -> &mut Self {
        self.args.insert(key, value.to_string());
        self
    }

    /// Substitute every `$...$` identifier of `template`.
    ///
    /// The template is split on `$`: odd tokens are identifiers, an empty odd token is an
    /// escaped `$$`. Unknown identifiers, unterminated `$`, invalid widths, undefined
    /// variables and unsafe representation ids all fail the whole build.
    pub fn resolve(&self, template: &str) -> MpdResult<String> {
        let tokens: Vec<&str> = template.split('$').collect();
        if tokens.len() % 2 == 0 {
            return Err(MpdError::Template(format!(
                "unterminated identifier in {template:?}"
            )));
        }

        let mut result = String::with_capacity(template.len());
        for (index, token) in tokens.into_iter().enumerate() {
            if index % 2 == 0 {
                result.push_str(token);
            } else if token.is_empty() {
                result.push('$');
            } else {
                self.substitute(token, &mut result)?;
            }
        }
        Ok(result)
    }

    fn substitute(&self, token: &str, dst: &mut String) -> MpdResult<()> {
        if token == Self::REPRESENTATION_ID {
            let id = self.value(Self::REPRESENTATION_ID)?;
            if !validate_rfc1738_url(id) {
                return Err(MpdError::Template(format!(
                    "representation id {id:?} is not a valid url fragment"
                )));
            }
            dst.push_str(id);
            return Ok(());
        }

        let (key, format) = [Self::NUMBER, Self::BANDWIDTH, Self::TIME]
            .into_iter()
            .find_map(|key| token.strip_prefix(key).map(|format| (key, format)))
            .ok_or_else(|| MpdError::Template(format!("unknown identifier ${token}$")))?;
        let value = self.value(key)?;

        if format.is_empty() {
            dst.push_str(value);
            return Ok(());
        }

        let caps = NUMERIC_FORMAT
            .captures(format)
            .ok_or_else(|| MpdError::Template(format!("invalid format {format:?} in ${token}$")))?;
        let width: usize = caps[1]
            .parse()
            .ok()
            .filter(|width| *width <= MAX_WIDTH)
            .ok_or_else(|| MpdError::Template(format!("invalid width in ${token}$")))?;
        dst.push_str(&format!("{value:0>width$}"));
        dst.push_str(&caps[2]);
        Ok(())
    }

    fn value(&self, key: &str) -> MpdResult<&str> {
        self.args
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| MpdError::Template(format!("variable {key} is not defined")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Template {
        let mut template = Template::new();
        template
            .insert(Template::REPRESENTATION_ID, "1")
            .insert(Template::NUMBER, 2)
            .insert(Template::TIME, 3)
            .insert(Template::BANDWIDTH, 4);
        template
    }

    #[test]
    fn test_template_replace() {
        let template = template();

        // Single digit
        assert_eq!(template.resolve("$RepresentationID$").unwrap(), "1");
        assert_eq!(template.resolve("$Number$").unwrap(), "2");
        assert_eq!(template.resolve("$Time$").unwrap(), "3");
        assert_eq!(template.resolve("$Bandwidth$").unwrap(), "4");

        // Double digit
        assert_eq!(template.resolve("$Number%02d$").unwrap(), "02");
        assert_eq!(template.resolve("$Time%02d$").unwrap(), "03");
        assert_eq!(template.resolve("$Bandwidth%02d$").unwrap(), "04");

        // Mixed variables
        assert_eq!(
            template.resolve("$RepresentationID$-$Number$").unwrap(),
            "1-2"
        );
        assert_eq!(template.resolve("$Time$-$Bandwidth$").unwrap(), "3-4");

        // All variables with different width
        assert_eq!(
            template
                .resolve("$RepresentationID$-$Number%09d$-$Time%02d$-$Bandwidth%02d$")
                .unwrap(),
            "1-000000002-03-04"
        );

        // Escaped dollar
        assert_eq!(template.resolve("a$$b$Number$.m4s").unwrap(), "a$b2.m4s");
        assert_eq!(template.resolve("$$").unwrap(), "$");

        // Width narrower than the value
        assert_eq!(template.resolve("$Number%0d$").unwrap(), "2");
    }

    #[test]
    fn test_template_determinism() {
        let mut template = Template::new();
        template
            .insert(Template::REPRESENTATION_ID, "720p")
            .insert(Template::NUMBER, 3)
            .insert(Template::BANDWIDTH, 0)
            .insert(Template::TIME, 0);
        assert_eq!(
            template
                .resolve("seg-$RepresentationID$-$Number%05d$.m4s")
                .unwrap(),
            "seg-720p-00003.m4s"
        );
    }

    #[test]
    fn test_time_is_64_bit() {
        let mut template = Template::new();
        template.insert(Template::TIME, u64::MAX);
        assert_eq!(
            template.resolve("$Time%021d$").unwrap(),
            format!("0{}", u64::MAX)
        );
    }

    #[test]
    fn test_template_rejects() {
        let template = template();
        assert!(template.resolve("seg-$Foo$.m4s").is_err());
        assert!(template.resolve("seg-$Number.m4s").is_err());
        assert!(template.resolve("seg-$Number%5d$.m4s").is_err());
        assert!(template.resolve("seg-$Number%05x$.m4s").is_err());
        assert!(template.resolve("seg-$RepresentationID%02d$.m4s").is_err());
        assert!(matches!(
            template.resolve("seg-$Number%0200000000d$.m4s"),
            Err(MpdError::Template(_))
        ));
        assert!(template.resolve("seg-$Number%0256d$.m4s").is_err());
        assert_eq!(template.resolve("$Number%0255d$").unwrap().len(), 255);
    }

    #[test]
    fn test_template_variable_not_defined() {
        let template = Template::new();
        assert!(template.resolve("$RepresentationID$").is_err());
        assert_eq!(template.resolve("plain.m4s").unwrap(), "plain.m4s");
    }

    #[test]
    fn test_unsafe_representation_id() {
        let mut template = Template::new();
        template.insert(Template::REPRESENTATION_ID, "video 1");
        assert!(template.resolve("$RepresentationID$.m4s").is_err());

        template.insert(Template::REPRESENTATION_ID, "video%2");
        assert!(template.resolve("$RepresentationID$.m4s").is_err());

        template.insert(Template::REPRESENTATION_ID, "video%201");
        assert_eq!(
            template.resolve("$RepresentationID$.m4s").unwrap(),
            "video%201.m4s"
        );
    }

    #[test]
    fn test_validate_numeric_format() {
        assert!(validate_numeric_format("%05d"));
        assert!(validate_numeric_format("%0d"));
        assert!(validate_numeric_format("%010d"));
        assert!(!validate_numeric_format("%5d"));
        assert!(!validate_numeric_format("%05"));
        assert!(!validate_numeric_format("%05s"));
        assert!(!validate_numeric_format("%05d%d"));
        assert!(!validate_numeric_format("05d"));
    }
}
