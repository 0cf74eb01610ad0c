//! The single shared modal surface all embedded content renders in.

/// Content materialized inside the overlay: a panel title, body lines, and
/// the URL the viewer can hand to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    pub title: String,
    pub body: Vec<String>,
    pub link: Option<String>,
}

/// At most one overlay is ever open; opening replaces whatever was shown
/// before, and closing clears the content so nothing stale survives a
/// reopen.
#[derive(Debug, Default)]
pub struct Overlay {
    visible: bool,
    content: Option<Fragment>,
}

impl Overlay {
    pub fn open(&mut self, fragment: Fragment) {
        self.content = Some(fragment);
        self.visible = true;
    }

    pub fn close(&mut self) {
        self.content = None;
        self.visible = false;
    }

    pub fn is_open(&self) -> bool {
        self.visible
    }

    pub fn content(&self) -> Option<&Fragment> {
        self.content.as_ref()
    }
}
