//! Post/page editor.

use super::PageBase;
use crate::driver::BrowserDriver;
use crate::locator::Selector;
use crate::result::NavegarResult;
use crate::wait::WaitOptions;
use std::sync::Arc;

/// The content editor, for both posts and pages
#[derive(Debug)]
pub struct EditorPage {
    base: PageBase,
}

impl EditorPage {
    fn defining() -> Selector {
        Selector::css("div.editor")
    }

    /// Expect the editor on the current page
    pub async fn expect(driver: Arc<dyn BrowserDriver>, wait: WaitOptions) -> NavegarResult<Self> {
        let base = PageBase::expect(driver, Self::defining(), "EditorPage", wait).await?;
        Ok(Self { base })
    }

    /// Type the post title
    pub async fn enter_title(&self, title: &str) -> NavegarResult<()> {
        self.base
            .set_text(&Selector::css(".editor__title input"), title)
            .await
    }

    /// Type into the content area
    pub async fn enter_content(&self, content: &str) -> NavegarResult<()> {
        self.base
            .set_text(&Selector::css(".editor__content"), content)
            .await
    }

    /// Publish and wait for the confirmation notice
    pub async fn publish(&self) -> NavegarResult<()> {
        self.base
            .click(&Selector::css("button.editor__publish"))
            .await?;
        self.base
            .wait_for(&Selector::css(".notice.is-published"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;

    #[tokio::test]
    async fn test_write_and_publish() {
        let mock = Arc::new(MockDriver::new());
        mock.add_elements([
            "div.editor",
            ".editor__title input",
            ".editor__content",
            "button.editor__publish",
        ]);
        mock.on_click_reveal("button.editor__publish", [".notice.is-published"]);
        let driver: Arc<dyn BrowserDriver> = mock.clone();
        let editor = EditorPage::expect(driver, WaitOptions::new(200).with_poll_interval(10))
            .await
            .unwrap();
        editor.enter_title("Hello").await.unwrap();
        editor.enter_content("First post.").await.unwrap();
        editor.publish().await.unwrap();
        assert_eq!(mock.clicks(), vec!["button.editor__publish".to_string()]);
    }
}
