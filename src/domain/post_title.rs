use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone)]
pub struct PostTitle(String);

impl PostTitle {
    pub fn parse(s: String) -> Result<Self, String> {
        let is_empty_or_whitespace = s.trim().is_empty();
        let is_too_long = s.graphemes(true).count() > 256;

        if is_empty_or_whitespace || is_too_long {
            Err(format!("{} is not a valid post title.", s))
        } else {
            Ok(Self(s.trim().to_string()))
        }
    }
}

impl AsRef<str> for PostTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
