//! Browser driver capabilities.
//!
//! The engine never talks to a browser directly. It depends on three small
//! capability traits, which any automation backend (CDP, WebDriver, a test
//! double) can implement:
//!
//! ```text
//! ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────┐
//! │  ElementLocator  │  │  ScreenshotSaver │  │  ScriptExecutor  │
//! │  find_elements   │  │  capture         │  │  execute_script  │
//! │  css_value       │  │  window_size     │  │                  │
//! └──────────────────┘  └──────────────────┘  └──────────────────┘
//!            └───────────── BrowserDriver ─────────────┘
//! ```
//!
//! [`MockDriver`] implements all three for unit tests.

use crate::result::{MiradaError, MiradaResult};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Element position and size on the page, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f32,
    /// Y position
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the box covers no pixels
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Element handle for DOM interactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Unique identifier for the element (stable within a session)
    pub id: String,
    /// Element tag name
    pub tag_name: String,
    /// Bounding box if rendered
    pub bounding_box: Option<BoundingBox>,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
            bounding_box: None,
        }
    }

    /// Set the bounding box
    #[must_use]
    pub const fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    /// Rendered size `(width, height)`
    #[must_use]
    pub fn size(&self) -> Option<(f32, f32)> {
        self.bounding_box.map(|b| (b.width, b.height))
    }

    /// Position on the page `(x, y)`
    #[must_use]
    pub fn location_on_page(&self) -> Option<(f32, f32)> {
        self.bounding_box.map(|b| (b.x, b.y))
    }
}

/// What to capture
#[derive(Debug, Clone, Copy)]
pub enum CaptureTarget<'a> {
    /// Just the element's box
    Element(&'a ElementHandle),
    /// The whole viewport
    Viewport,
}

/// Finds elements and reads their computed style
pub trait ElementLocator {
    /// All elements matching `selector` (may be empty)
    fn find_elements(&self, selector: &str) -> MiradaResult<Vec<ElementHandle>>;

    /// Computed CSS value of `property` on `element`
    fn css_value(&self, element: &ElementHandle, property: &str) -> MiradaResult<String>;
}

/// Takes screenshots
pub trait ScreenshotSaver {
    /// Encoded image bytes (PNG or JPEG) of the target
    fn capture_screenshot(&self, target: CaptureTarget<'_>) -> MiradaResult<Vec<u8>>;

    /// Browser window size `(width, height)`
    fn window_size(&self) -> MiradaResult<(u32, u32)>;
}

/// Runs JavaScript in the page
pub trait ScriptExecutor {
    /// Execute `script`; `args` are exposed to it as `arguments[0..]`
    fn execute_script(
        &self,
        script: &str,
        args: &[ElementHandle],
    ) -> MiradaResult<serde_json::Value>;
}

/// Everything the engine needs from a browser
pub trait BrowserDriver: ElementLocator + ScreenshotSaver + ScriptExecutor {}

impl<T: ElementLocator + ScreenshotSaver + ScriptExecutor> BrowserDriver for T {}

pub(crate) const VISIBILITY_SCRIPT_PREFIX: &str = "arguments[0].style.visibility = ";

/// Mock driver for unit testing
///
/// Elements are registered per selector; screenshots per element id. The mock
/// understands the visibility script the engine sends and updates the stored
/// `visibility` style accordingly.
#[derive(Debug)]
pub struct MockDriver {
    elements: HashMap<String, Vec<ElementHandle>>,
    screenshots: HashMap<String, Vec<u8>>,
    viewport_screenshot: Option<Vec<u8>>,
    window_size: (u32, u32),
    styles: RefCell<HashMap<(String, String), String>>,
    call_history: RefCell<Vec<String>>,
    scripts_fail: Cell<bool>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self {
            elements: HashMap::new(),
            screenshots: HashMap::new(),
            viewport_screenshot: None,
            window_size: (1280, 800),
            styles: RefCell::new(HashMap::new()),
            call_history: RefCell::new(Vec::new()),
            scripts_fail: Cell::new(false),
        }
    }
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element matched by `selector`
    #[must_use]
    pub fn with_element(mut self, selector: impl Into<String>, element: ElementHandle) -> Self {
        self.add_element(selector, element);
        self
    }

    /// Register an element matched by `selector`
    pub fn add_element(&mut self, selector: impl Into<String>, element: ElementHandle) {
        self.elements.entry(selector.into()).or_default().push(element);
    }

    /// Set the screenshot returned for an element id
    pub fn set_screenshot(&mut self, element_id: impl Into<String>, data: Vec<u8>) {
        self.screenshots.insert(element_id.into(), data);
    }

    /// Set the screenshot returned for an element id
    #[must_use]
    pub fn with_screenshot(mut self, element_id: impl Into<String>, data: Vec<u8>) -> Self {
        self.set_screenshot(element_id, data);
        self
    }

    /// Set the viewport screenshot
    #[must_use]
    pub fn with_viewport_screenshot(mut self, data: Vec<u8>) -> Self {
        self.viewport_screenshot = Some(data);
        self
    }

    /// Set the window size
    #[must_use]
    pub const fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    /// Preset a computed style value
    #[must_use]
    pub fn with_style(
        self,
        element_id: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.styles
            .borrow_mut()
            .insert((element_id.into(), property.into()), value.into());
        self
    }

    /// Current style value, if one was set
    #[must_use]
    pub fn style(&self, element_id: &str, property: &str) -> Option<String> {
        self.styles
            .borrow()
            .get(&(element_id.to_string(), property.to_string()))
            .cloned()
    }

    /// Make every following script call fail (or succeed again)
    pub fn set_scripts_fail(&self, fail: bool) {
        self.scripts_fail.set(fail);
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.call_history.borrow().clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.borrow().iter().any(|c| c.starts_with(method))
    }

    fn record(&self, call: String) {
        self.call_history.borrow_mut().push(call);
    }
}

impl ElementLocator for MockDriver {
    fn find_elements(&self, selector: &str) -> MiradaResult<Vec<ElementHandle>> {
        self.record(format!("find_elements:{selector}"));
        Ok(self.elements.get(selector).cloned().unwrap_or_default())
    }

    fn css_value(&self, element: &ElementHandle, property: &str) -> MiradaResult<String> {
        self.record(format!("css_value:{}:{property}", element.id));
        Ok(self
            .style(&element.id, property)
            .unwrap_or_else(|| default_style(property).to_string()))
    }
}

impl ScreenshotSaver for MockDriver {
    fn capture_screenshot(&self, target: CaptureTarget<'_>) -> MiradaResult<Vec<u8>> {
        match target {
            CaptureTarget::Element(element) => {
                self.record(format!("capture_screenshot:{}", element.id));
                self.screenshots.get(&element.id).cloned().ok_or_else(|| {
                    MiradaError::driver(format!("no mock screenshot for element {}", element.id))
                })
            }
            CaptureTarget::Viewport => {
                self.record("capture_screenshot:viewport".to_string());
                self.viewport_screenshot
                    .clone()
                    .ok_or_else(|| MiradaError::driver("no mock viewport screenshot"))
            }
        }
    }

    fn window_size(&self) -> MiradaResult<(u32, u32)> {
        Ok(self.window_size)
    }
}

impl ScriptExecutor for MockDriver {
    fn execute_script(
        &self,
        script: &str,
        args: &[ElementHandle],
    ) -> MiradaResult<serde_json::Value> {
        self.record(format!("execute_script:{script}"));
        if self.scripts_fail.get() {
            return Err(MiradaError::driver("mock script failure"));
        }
        if let (Some(literal), Some(element)) =
            (script.strip_prefix(VISIBILITY_SCRIPT_PREFIX), args.first())
        {
            let value: String = serde_json::from_str(literal.trim_end_matches(';'))?;
            self.styles
                .borrow_mut()
                .insert((element.id.clone(), "visibility".to_string()), value);
        }
        Ok(serde_json::Value::Null)
    }
}

fn default_style(property: &str) -> &'static str {
    match property {
        "visibility" => "visible",
        "display" => "block",
        _ => "",
    }
}
