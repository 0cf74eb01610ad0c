//! Decides, from a link's declared type and source string, the single action
//! the UI performs for it.

use crate::feed::{LinkEntry, LinkType};

pub const YOUTUBE_EMBED_BASE: &str = "https://www.youtube.com/embed/";
pub const COMMENT_BASE_URL: &str = "https://existenz.se/";

const IMAGE_SUFFIXES: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".webp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationAction {
    EmbedVideo { embed_url: String },
    EmbedImage { url: String },
    EmbedVideoFile { url: String },
    EmbedIframe { url: String },
    OpenExternal { url: String },
}

impl PresentationAction {
    /// The URL the action ultimately points at, embed form included.
    pub fn url(&self) -> &str {
        match self {
            PresentationAction::EmbedVideo { embed_url } => embed_url,
            PresentationAction::EmbedImage { url }
            | PresentationAction::EmbedVideoFile { url }
            | PresentationAction::EmbedIframe { url }
            | PresentationAction::OpenExternal { url } => url,
        }
    }
}

/// Resolution order is part of the contract and must not be reshuffled:
/// youtube type, then image type or image extension, then the mp4
/// extension, then iframe type, then redirect, then the external-open
/// fallback. A `redirect` link pointing at a `.png` is therefore an image,
/// and a source with no recognizable extension falls through to an
/// external open rather than an error.
pub fn resolve(kind: LinkType, src: &str) -> PresentationAction {
    if kind == LinkType::Youtube {
        // src is the bare video id, not a URL.
        return PresentationAction::EmbedVideo {
            embed_url: format!("{YOUTUBE_EMBED_BASE}{src}"),
        };
    }
    let untyped = matches!(kind, LinkType::Plain | LinkType::Redirect);
    if kind == LinkType::Image || (untyped && has_image_suffix(src)) {
        return PresentationAction::EmbedImage {
            url: src.to_string(),
        };
    }
    if src.ends_with(".mp4") {
        return PresentationAction::EmbedVideoFile {
            url: src.to_string(),
        };
    }
    match kind {
        LinkType::Iframe => PresentationAction::EmbedIframe {
            url: src.to_string(),
        },
        _ => PresentationAction::OpenExternal {
            url: src.to_string(),
        },
    }
}

pub fn resolve_entry(entry: &LinkEntry) -> PresentationAction {
    resolve(entry.kind, &entry.src)
}

/// The comment affordance is a parallel dispatch: whatever the entry's own
/// type, it always iframes the discussion page on the feed's home site.
pub fn comment_action(comment_url: &str) -> PresentationAction {
    PresentationAction::EmbedIframe {
        url: format!("{COMMENT_BASE_URL}{comment_url}"),
    }
}

fn has_image_suffix(src: &str) -> bool {
    // Case-sensitive literal suffix match, same as the feed has always
    // published its sources.
    IMAGE_SUFFIXES.iter().any(|suffix| src.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_id_builds_embed_url() {
        let action = resolve(LinkType::Youtube, "dQw4w9WgXcQ");
        assert_eq!(
            action,
            PresentationAction::EmbedVideo {
                embed_url: "https://www.youtube.com/embed/dQw4w9WgXcQ".into()
            }
        );
    }

    #[test]
    fn image_extension_wins_over_redirect_type() {
        let action = resolve(LinkType::Redirect, "https://example.com/cat.png");
        assert_eq!(
            action,
            PresentationAction::EmbedImage {
                url: "https://example.com/cat.png".into()
            }
        );
    }

    #[test]
    fn redirect_without_media_extension_opens_externally() {
        let action = resolve(LinkType::Redirect, "https://example.com/page");
        assert_eq!(
            action,
            PresentationAction::OpenExternal {
                url: "https://example.com/page".into()
            }
        );
    }

    #[test]
    fn declared_image_type_embeds_regardless_of_extension() {
        let action = resolve(LinkType::Image, "https://example.com/img?id=9");
        assert!(matches!(action, PresentationAction::EmbedImage { .. }));
    }

    #[test]
    fn plain_link_with_image_extension_embeds() {
        let action = resolve(LinkType::Plain, "https://example.com/shot.webp");
        assert!(matches!(action, PresentationAction::EmbedImage { .. }));
    }

    #[test]
    fn extension_match_is_case_sensitive() {
        let action = resolve(LinkType::Redirect, "https://example.com/CAT.PNG");
        assert!(matches!(action, PresentationAction::OpenExternal { .. }));
    }

    #[test]
    fn mp4_extension_wins_over_declared_type() {
        for kind in [LinkType::Plain, LinkType::Redirect, LinkType::Iframe] {
            let action = resolve(kind, "https://example.com/clip.mp4");
            assert!(matches!(action, PresentationAction::EmbedVideoFile { .. }));
        }
    }

    #[test]
    fn iframe_type_embeds_page() {
        let action = resolve(LinkType::Iframe, "https://news.example/x");
        assert_eq!(
            action,
            PresentationAction::EmbedIframe {
                url: "https://news.example/x".into()
            }
        );
    }

    #[test]
    fn iframe_type_keeps_image_extension_as_iframe() {
        // The extension shortcut only applies to plain and redirect links;
        // an explicitly iframe-typed source stays an iframe.
        let action = resolve(LinkType::Iframe, "https://example.com/chart.png");
        assert!(matches!(action, PresentationAction::EmbedIframe { .. }));
    }

    #[test]
    fn extensionless_unknown_link_falls_through_to_external() {
        let action = resolve(LinkType::Plain, "https://example.com/whatever");
        assert!(matches!(action, PresentationAction::OpenExternal { .. }));
    }

    #[test]
    fn comment_action_iframes_discussion_site_regardless_of_kind() {
        let action = comment_action("t/123");
        assert_eq!(
            action,
            PresentationAction::EmbedIframe {
                url: "https://existenz.se/t/123".into()
            }
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let first = resolve(LinkType::Redirect, "https://example.com/cat.gif");
        let second = resolve(LinkType::Redirect, "https://example.com/cat.gif");
        assert_eq!(first, second);
    }
}
