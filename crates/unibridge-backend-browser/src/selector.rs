//! Translation of unified locators into DOM queries.

use unibridge_protocols::types::{Locator, LocatorStrategy};

/// A query the DOM domain can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomQuery {
    /// `DOM.querySelectorAll`.
    Css(String),
    /// `DOM.performSearch` with an XPath expression.
    XPath(String),
}

/// Map a locator onto a CSS selector or XPath expression.
///
/// Strategies that only exist on mobile automation servers are rejected.
pub fn query_for(locator: &Locator) -> Result<DomQuery, String> {
    let value = locator.value.as_str();
    Ok(match locator.strategy {
        LocatorStrategy::CssSelector | LocatorStrategy::TagName => DomQuery::Css(value.to_string()),
        LocatorStrategy::Id => DomQuery::Css(attribute_selector("id", value)),
        LocatorStrategy::Name => DomQuery::Css(attribute_selector("name", value)),
        LocatorStrategy::AccessibilityId => DomQuery::Css(attribute_selector("aria-label", value)),
        LocatorStrategy::ClassName => {
            let classes: Vec<&str> = value.split_whitespace().collect();
            if classes.is_empty() {
                return Err("class name locator is empty".to_string());
            }
            DomQuery::Css(format!(".{}", classes.join(".")))
        }
        LocatorStrategy::Xpath => DomQuery::XPath(value.to_string()),
        LocatorStrategy::LinkText => {
            DomQuery::XPath(format!("//a[normalize-space(.)={}]", xpath_literal(value)))
        }
        LocatorStrategy::AndroidUiAutomator
        | LocatorStrategy::IosPredicate
        | LocatorStrategy::IosClassChain => {
            return Err(format!(
                "locator strategy '{}' is not available in browser sessions",
                locator.strategy
            ));
        }
    })
}

fn attribute_selector(attribute: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[{}=\"{}\"]", attribute, escaped)
}

fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        format!("\"{}\"", value)
    } else if !value.contains('\'') {
        format!("'{}'", value)
    } else {
        let parts: Vec<String> = value.split('"').map(|p| format!("\"{}\"", p)).collect();
        format!("concat({})", parts.join(", '\"', "))
    }
}
