use crate::models::{flag, macros::non_empty, parse_time};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Placeholder title the sites use for posts without one.
const NO_TITLE: &str = "无标题";
/// Placeholder name the sites use for anonymous posters.
const NO_NAME: &str = "无名氏";

/// A thread opener or reply, as returned by post list and thread fetches.
///
/// Field values are kept as the site sends them; the accessors interpret them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// The post ID.
    #[serde(default)]
    id: String,

    /// Image key, empty if the post has no image.
    #[serde(default)]
    img: String,

    /// Image extension including the dot (e.g. `.jpg`).
    #[serde(default)]
    ext: String,

    /// Post time, `yyyy-MM-dd(dow)HH:mm:ss` in GMT+08:00.
    #[serde(default)]
    now: String,

    /// Poster's cookie ID.
    #[serde(default)]
    userid: String,

    /// Poster's name.
    #[serde(default)]
    name: String,

    /// Poster's e-mail.
    #[serde(default)]
    email: String,

    /// Post title.
    #[serde(default)]
    title: String,

    /// Post body as HTML.
    #[serde(default)]
    content: String,

    /// `"1"` if the thread was sunk.
    #[serde(default)]
    sage: String,

    /// `"1"` if the poster is an admin.
    #[serde(default)]
    admin: String,

    /// Number of replies, as a string.
    #[serde(default, rename = "replyCount")]
    reply_count: String,

    /// The replies included with the post, if any.
    #[serde(default, rename = "replys", skip_serializing_if = "Vec::is_empty")]
    replies: Vec<Post>,
}

impl Post {
    /// Returns the post ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the raw post time string.
    pub fn now(&self) -> &str {
        &self.now
    }

    /// Returns the parsed post time, if it parses.
    pub fn time(&self) -> Option<DateTime<FixedOffset>> {
        parse_time(&self.now)
    }

    /// Returns the poster's cookie ID.
    pub fn user_id(&self) -> &str {
        &self.userid
    }

    /// Returns the poster's name, unless it is empty or the anonymous placeholder.
    pub fn name(&self) -> Option<&str> {
        non_empty!(self.name).filter(|name| *name != NO_NAME)
    }

    /// Returns the poster's e-mail (if present).
    pub fn email(&self) -> Option<&str> {
        non_empty!(self.email)
    }

    /// Returns the title, unless it is empty or the untitled placeholder.
    pub fn title(&self) -> Option<&str> {
        non_empty!(self.title).filter(|title| *title != NO_TITLE)
    }

    /// Returns the HTML body.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns whether the thread was sunk.
    pub fn is_sage(&self) -> bool {
        flag(&self.sage)
    }

    /// Returns whether the poster is an admin.
    pub fn is_admin(&self) -> bool {
        flag(&self.admin)
    }

    /// Returns the reply count, if the site sent a number.
    pub fn reply_count(&self) -> Option<u32> {
        self.reply_count.trim().parse().ok()
    }

    /// Returns the image file name (`img` + `ext`) if the post has an image.
    pub fn image(&self) -> Option<String> {
        non_empty!(self.img).map(|img| format!("{img}{}", self.ext))
    }

    /// Returns the replies included with the post.
    pub fn replies(&self) -> &[Post] {
        &self.replies
    }
}
