use crate::models::{macros::non_empty, parse_time};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A single post looked up by ID, as shown when a post body quotes `>>No.123`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default)]
    id: String,
    /// Thread the referenced post belongs to.
    #[serde(default, rename = "postId")]
    post_id: String,
    #[serde(default)]
    userid: String,
    #[serde(default)]
    now: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    img: String,
    #[serde(default)]
    ext: String,
}

impl Reference {
    /// Returns the referenced post's ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the ID of the thread containing the post (if known).
    pub fn post_id(&self) -> Option<&str> {
        non_empty!(self.post_id)
    }

    /// Returns the poster's cookie ID.
    pub fn user_id(&self) -> &str {
        &self.userid
    }

    /// Returns the parsed post time, if it parses.
    pub fn time(&self) -> Option<DateTime<FixedOffset>> {
        parse_time(&self.now)
    }

    /// Returns the HTML body.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the image file name (`img` + `ext`) if the post has an image.
    pub fn image(&self) -> Option<String> {
        non_empty!(self.img).map(|img| format!("{img}{}", self.ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_reference() {
        let reference: Reference = serde_json::from_str(
            r#"{"id": "77", "postId": "70", "userid": "u", "now": "2016-01-02(六)03:04:05", "content": "quoted"}"#,
        )
        .unwrap();
        assert_eq!(reference.id(), "77");
        assert_eq!(reference.post_id(), Some("70"));
        assert_eq!(reference.content(), "quoted");
        assert!(reference.time().is_some());
        assert!(reference.image().is_none());
    }
}
