//! Temporarily hiding noisy page content.
//!
//! Dynamic elements (ads, clocks, carousels) make screenshots unstable.
//! [`ElementVisibilityController`] sets `visibility: hidden` on them through
//! the script capability and remembers each element's prior computed value so
//! it can be restored later.

use crate::driver::{BrowserDriver, ElementHandle, VISIBILITY_SCRIPT_PREFIX};
use crate::result::MiradaResult;

const HIDDEN: &str = "hidden";
const VISIBLE: &str = "visible";

/// An element hidden by the controller
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenElement {
    /// Handle used to restore the element
    pub element: ElementHandle,
    /// Computed `visibility` before hiding
    pub original_visibility: String,
}

/// Tracks elements whose visibility was overridden
#[derive(Debug, Default)]
pub struct ElementVisibilityController {
    hidden: Vec<HiddenElement>,
}

impl ElementVisibilityController {
    /// Create an empty controller
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide every element matching `selector`.
    ///
    /// Elements that are already tracked or already computed as hidden are
    /// left alone, so calling this twice is a no-op. Returns the number of
    /// elements newly hidden.
    pub fn hide<D: BrowserDriver + ?Sized>(&mut self, driver: &D, selector: &str) -> MiradaResult<usize> {
        let mut newly_hidden = 0;
        for element in driver.find_elements(selector)? {
            if self.position(&element.id).is_some() {
                continue;
            }
            let visibility = driver.css_value(&element, "visibility")?;
            if visibility == HIDDEN {
                continue;
            }
            set_visibility(driver, &element, HIDDEN)?;
            tracing::debug!(selector, element = %element.id, previous = %visibility, "hid element");
            self.hidden.push(HiddenElement {
                element,
                original_visibility: visibility,
            });
            newly_hidden += 1;
        }
        Ok(newly_hidden)
    }

    /// Restore elements.
    ///
    /// With a selector, every matching element is restored: tracked ones to
    /// their recorded value, untracked ones to `visible`. Without a selector,
    /// every tracked element is restored and the set is cleared.
    pub fn unhide<D: BrowserDriver + ?Sized>(
        &mut self,
        driver: &D,
        selector: Option<&str>,
    ) -> MiradaResult<usize> {
        let Some(selector) = selector else {
            return self.restore_all(driver);
        };

        let elements = driver.find_elements(selector)?;
        for element in &elements {
            match self.position(&element.id) {
                Some(index) => {
                    set_visibility(driver, element, &self.hidden[index].original_visibility)?;
                    self.hidden.remove(index);
                }
                None => set_visibility(driver, element, VISIBLE)?,
            }
        }
        Ok(elements.len())
    }

    /// Restore every tracked element
    pub fn restore_all<D: BrowserDriver + ?Sized>(&mut self, driver: &D) -> MiradaResult<usize> {
        let restored = self.hidden.len();
        // Entries leave the set only once their restore succeeded.
        while let Some(entry) = self.hidden.first() {
            set_visibility(driver, &entry.element, &entry.original_visibility)?;
            self.hidden.remove(0);
        }
        if restored > 0 {
            tracing::debug!(restored, "restored hidden elements");
        }
        Ok(restored)
    }

    /// Currently hidden elements, in the order they were hidden
    #[must_use]
    pub fn hidden_elements(&self) -> &[HiddenElement] {
        &self.hidden
    }

    /// Whether `element_id` is tracked
    #[must_use]
    pub fn is_hidden(&self, element_id: &str) -> bool {
        self.position(element_id).is_some()
    }

    /// Number of tracked elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.hidden.len()
    }

    /// Whether nothing is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hidden.is_empty()
    }

    fn position(&self, element_id: &str) -> Option<usize> {
        self.hidden.iter().position(|h| h.element.id == element_id)
    }
}

/// Script that sets `visibility` on `arguments[0]`
#[must_use]
pub fn visibility_script(value: &str) -> String {
    // JSON string literals are valid JavaScript string literals
    let literal = serde_json::Value::String(value.to_string()).to_string();
    format!("{VISIBILITY_SCRIPT_PREFIX}{literal};")
}

fn set_visibility<D: BrowserDriver + ?Sized>(
    driver: &D,
    element: &ElementHandle,
    value: &str,
) -> MiradaResult<()> {
    driver.execute_script(&visibility_script(value), std::slice::from_ref(element))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ElementLocator, MockDriver};

    fn banner_driver() -> MockDriver {
        MockDriver::new()
            .with_element("#banner", ElementHandle::new("banner", "div"))
            .with_element(".ad", ElementHandle::new("ad-1", "aside"))
            .with_element(".ad", ElementHandle::new("ad-2", "aside"))
    }

    #[test]
    fn test_visibility_script() {
        assert_eq!(
            visibility_script("hidden"),
            "arguments[0].style.visibility = \"hidden\";"
        );
        assert_eq!(
            visibility_script("it's"),
            "arguments[0].style.visibility = \"it's\";"
        );
    }

    #[test]
    fn test_hide_records_original_value() {
        let driver = banner_driver().with_style("banner", "visibility", "collapse");
        let mut controller = ElementVisibilityController::new();

        assert_eq!(controller.hide(&driver, "#banner").unwrap(), 1);
        assert!(controller.is_hidden("banner"));
        assert_eq!(controller.hidden_elements()[0].original_visibility, "collapse");
        assert_eq!(driver.style("banner", "visibility").as_deref(), Some("hidden"));
    }

    #[test]
    fn test_hide_is_idempotent() {
        let driver = banner_driver();
        let mut controller = ElementVisibilityController::new();

        controller.hide(&driver, "#banner").unwrap();
        assert_eq!(controller.hide(&driver, "#banner").unwrap(), 0);
        assert_eq!(controller.len(), 1);
        assert_eq!(controller.hidden_elements()[0].original_visibility, "visible");
    }

    #[test]
    fn test_hide_skips_already_hidden_elements() {
        let driver = banner_driver().with_style("banner", "visibility", "hidden");
        let mut controller = ElementVisibilityController::new();
        assert_eq!(controller.hide(&driver, "#banner").unwrap(), 0);
        assert!(controller.is_empty());
    }

    #[test]
    fn test_unhide_all_restores_and_clears() {
        let driver = banner_driver().with_style("ad-2", "visibility", "inherit");
        let mut controller = ElementVisibilityController::new();
        controller.hide(&driver, "#banner").unwrap();
        controller.hide(&driver, ".ad").unwrap();
        assert_eq!(controller.len(), 3);

        assert_eq!(controller.unhide(&driver, None).unwrap(), 3);
        assert!(controller.is_empty());
        assert_eq!(driver.style("banner", "visibility").as_deref(), Some("visible"));
        assert_eq!(driver.style("ad-2", "visibility").as_deref(), Some("inherit"));
    }

    #[test]
    fn test_unhide_selector_only_touches_matches() {
        let driver = banner_driver();
        let mut controller = ElementVisibilityController::new();
        controller.hide(&driver, "#banner").unwrap();
        controller.hide(&driver, ".ad").unwrap();

        controller.unhide(&driver, Some(".ad")).unwrap();
        assert_eq!(controller.len(), 1);
        assert!(controller.is_hidden("banner"));
        assert_eq!(driver.style("ad-1", "visibility").as_deref(), Some("visible"));
        assert_eq!(driver.style("banner", "visibility").as_deref(), Some("hidden"));
    }

    #[test]
    fn test_unhide_untracked_falls_back_to_visible() {
        let driver = banner_driver().with_style("banner", "visibility", "hidden");
        let mut controller = ElementVisibilityController::new();

        controller.unhide(&driver, Some("#banner")).unwrap();
        assert_eq!(
            driver.css_value(&ElementHandle::new("banner", "div"), "visibility").unwrap(),
            "visible"
        );
    }

    #[test]
    fn test_failed_unhide_keeps_element_tracked() {
        let driver = banner_driver().with_style("banner", "visibility", "collapse");
        let mut controller = ElementVisibilityController::new();
        controller.hide(&driver, "#banner").unwrap();

        driver.set_scripts_fail(true);
        assert!(controller.unhide(&driver, Some("#banner")).is_err());
        assert!(controller.is_hidden("banner"));

        driver.set_scripts_fail(false);
        assert_eq!(controller.restore_all(&driver).unwrap(), 1);
        assert!(controller.is_empty());
        assert_eq!(driver.style("banner", "visibility").as_deref(), Some("collapse"));
    }

    #[test]
    fn test_hidden_element_equality() {
        let a = HiddenElement {
            element: ElementHandle::new("banner", "div"),
            original_visibility: "visible".to_string(),
        };
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_unhide_all_when_empty_is_noop() {
        let driver = banner_driver();
        let mut controller = ElementVisibilityController::new();
        assert_eq!(controller.unhide(&driver, None).unwrap(), 0);
        assert!(!driver.was_called("execute_script"));
    }
}
