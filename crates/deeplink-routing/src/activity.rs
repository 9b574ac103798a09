//! Continued user activities.
//!
//! Universal links reach an application as a continued activity rather than
//! as a raw URL. Only browsing-web activities carry a routable URL.

use url::Url;

/// The activity type of a web page handed off to the application.
pub const BROWSING_WEB_ACTIVITY_TYPE: &str = "NSUserActivityTypeBrowsingWeb";

/// A continued activity as delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserActivity {
    /// The platform activity type.
    pub activity_type: String,
    /// The web page URL, for browsing-web activities.
    pub webpage_url: Option<Url>,
}

impl UserActivity {
    /// Creates an activity of any type.
    pub fn new(activity_type: impl Into<String>, webpage_url: Option<Url>) -> Self {
        Self {
            activity_type: activity_type.into(),
            webpage_url,
        }
    }

    /// Creates a browsing-web activity for `url`.
    pub fn browsing_web(url: Url) -> Self {
        Self::new(BROWSING_WEB_ACTIVITY_TYPE, Some(url))
    }

    /// Returns `true` for browsing-web activities.
    pub fn is_browsing_web(&self) -> bool {
        self.activity_type == BROWSING_WEB_ACTIVITY_TYPE
    }

    /// Returns the routable URL: the web page URL of a browsing-web activity.
    pub fn url(&self) -> Option<&Url> {
        self.webpage_url.as_ref().filter(|_| self.is_browsing_web())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browsing_web_exposes_url() {
        let url = Url::parse("https://dpl.io/foo/1").unwrap();
        let activity = UserActivity::browsing_web(url.clone());
        assert!(activity.is_browsing_web());
        assert_eq!(activity.url(), Some(&url));
    }

    #[test]
    fn test_other_activity_has_no_routable_url() {
        let url = Url::parse("https://dpl.io/foo/1").unwrap();
        let activity = UserActivity::new("com.example.handoff", Some(url));
        assert!(activity.url().is_none());
    }

    #[test]
    fn test_browsing_web_without_url() {
        let activity = UserActivity::new(BROWSING_WEB_ACTIVITY_TYPE, None);
        assert!(activity.url().is_none());
    }
}
