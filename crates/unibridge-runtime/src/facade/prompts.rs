//! Prompt construction for facade operations.

use serde::{Deserialize, Serialize};

use super::ScreenContext;

/// Screens sent to `analyze_app_structure`, at most.
pub const MAX_ANALYZED_SCREENS: usize = 5;

/// Characters kept from each analyzed screen's source.
pub const MAX_SCREEN_CHARS: usize = 2000;

pub const INTERPRET_SYSTEM: &str = "\
You are an expert in mobile and web test automation.
Convert the user's natural-language command into a sequence of primitive UI steps.

Return a JSON object of the form:
{
  \"steps\": [
    {
      \"action\": \"<action>\",
      \"locator\": {\"strategy\": \"<strategy>\", \"value\": \"<value>\"},
      \"parameters\": {\"<name>\": \"<value>\"}
    }
  ]
}

Actions and their parameters:
- navigate: {\"target\": \"<url or app id; empty launches the app>\"}
- find / find_all: locator only
- click, clear, get_text: locator of the target element
- type: locator of the target element, {\"text\": \"<text>\"}
- get_attribute: locator of the target element, {\"name\": \"<attribute>\"}
- screenshot: optional locator for an element-scoped capture
- execute_script: {\"script\": \"<javascript>\", \"args\": []} (browser only)
- switch_context: {\"name\": \"<NATIVE_APP or WEBVIEW_...>\"} (mobile only)
- get_contexts: no parameters (mobile only)
- page_source, back: no parameters

Locator strategies: \"id\", \"accessibility id\", \"class name\", \"xpath\", \"name\",
\"css selector\" (web), \"-android uiautomator\", \"-ios predicate string\", \"-ios class chain\".

Omit \"locator\" for steps that do not target an element. Use the app state
context, when provided, to choose locators that exist on the current screen.";

pub const DESCRIBE_SYSTEM: &str = "\
You are an expert in mobile app testing and user interfaces.
Analyze the XML/HTML representation of an app screen and describe it.

Focus on:
1. The overall purpose of the screen (e.g. login, settings, profile)
2. Key UI elements present (text fields, buttons, labels)
3. The layout and structure of the screen
4. Notable accessibility features or issues

Be comprehensive but concise, so that someone could understand the screen without seeing it.";

pub const SUGGEST_SYSTEM: &str = "\
You are an expert in mobile app testing with Appium.
Analyze the XML/HTML representation of an app screen and suggest test actions.

Return 5-10 natural-language test commands as a JSON object:
{\"suggestions\": [\"Click the login button\", \"Enter 'test@example.com' in the email field\"]}

Focus on important functionality, user flows, error states and edge cases,
and the display of dynamic content.";

pub const ANALYZE_SYSTEM: &str = "\
You are an expert in mobile app architecture and testing.
Analyze several screens of one app and describe its structure.

Return a JSON object of the form:
{
  \"app_type\": \"e-commerce | social media | utility | ...\",
  \"screens\": [
    {\"name\": \"...\", \"purpose\": \"...\", \"key_elements\": [\"...\"]}
  ],
  \"flows\": [
    {\"name\": \"...\", \"description\": \"...\", \"screens\": [\"screen names\"]}
  ],
  \"suggestions\": [\"testing or improvement suggestions\"]
}";

/// Strip control characters other than newline, carriage return and tab.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect()
}

pub fn interpret_prompt(command: &str, context: &ScreenContext) -> String {
    let mut info = String::new();
    if let Some(source) = &context.page_source {
        info.push_str("\nCurrent page source:\n");
        info.push_str(source);
        info.push('\n');
    }
    if let Some(current) = &context.current_context {
        info.push_str(&format!("\nCurrent context: {}\n", current));
    }
    if context.has_screenshot {
        info.push_str("\nA screenshot is available for reference.\n");
    }
    if let Some(platform) = &context.platform {
        info.push_str(&format!("\nPlatform: {}\n", platform));
    }
    if let Some(device) = &context.device_info {
        info.push_str(&format!("\nDevice info: {}\n", device));
    }

    format!(
        "App state context:{}\n\nCommand to interpret: {}",
        sanitize(&info),
        sanitize(command)
    )
}

pub fn describe_prompt(page_source: &str) -> String {
    format!(
        "Please describe this app screen based on its source:\n\n{}",
        sanitize(page_source)
    )
}

pub fn suggest_prompt(page_source: &str) -> String {
    format!(
        "Please suggest test actions for this app screen:\n\n{}",
        sanitize(page_source)
    )
}

pub fn analyze_prompt(page_sources: &[String]) -> String {
    let mut prompt =
        String::from("Please analyze these app screens and describe the app structure:\n\n");
    for (i, source) in page_sources.iter().take(MAX_ANALYZED_SCREENS).enumerate() {
        let truncated: String = source.chars().take(MAX_SCREEN_CHARS).collect();
        prompt.push_str(&format!("SCREEN {}:\n{}...\n\n", i + 1, sanitize(&truncated)));
    }
    prompt
}

pub fn script_prompt(language: ScriptLanguage, goal: &str, app_info: &serde_json::Value) -> String {
    let app_info = serde_json::to_string_pretty(app_info).unwrap_or_else(|_| app_info.to_string());
    format!(
        "Please generate a test script in {} for the following app and test goal.\n\n\
         TEST GOAL:\n{}\n\nAPP INFORMATION:\n{}",
        language.display_name(),
        sanitize(goal),
        sanitize(&app_info)
    )
}

/// Target language of a generated test script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLanguage {
    Python,
    Java,
    JavaScript,
    CSharp,
    Ruby,
    Robot,
}

impl ScriptLanguage {
    pub const ALL: [ScriptLanguage; 6] = [
        Self::Python,
        Self::Java,
        Self::JavaScript,
        Self::CSharp,
        Self::Ruby,
        Self::Robot,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::Java => "Java",
            Self::JavaScript => "JavaScript",
            Self::CSharp => "C#",
            Self::Ruby => "Ruby",
            Self::Robot => "Robot Framework",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Python => "py",
            Self::Java => "java",
            Self::JavaScript => "js",
            Self::CSharp => "cs",
            Self::Ruby => "rb",
            Self::Robot => "robot",
        }
    }

    pub fn comment_prefix(&self) -> &'static str {
        match self {
            Self::Python | Self::Ruby | Self::Robot => "#",
            Self::Java | Self::JavaScript | Self::CSharp => "//",
        }
    }

    /// Info strings accepted on a fenced code block for this language.
    pub fn fence_tags(&self) -> &'static [&'static str] {
        match self {
            Self::Python => &["python", "py"],
            Self::Java => &["java"],
            Self::JavaScript => &["javascript", "js", "typescript", "ts"],
            Self::CSharp => &["csharp", "cs", "c#"],
            Self::Ruby => &["ruby", "rb"],
            Self::Robot => &["robotframework", "robot"],
        }
    }

    pub fn system_prompt(&self) -> String {
        let (client, runner, setup, errors) = match self {
            Self::Python => (
                "the Appium Python client (from appium import webdriver)",
                "pytest or unittest",
                "setup and teardown",
                "try/except blocks",
            ),
            Self::Java => (
                "the Java client for Appium (io.appium:java-client)",
                "JUnit or TestNG",
                "@Before/@After setup and teardown methods",
                "try/catch blocks",
            ),
            Self::JavaScript => (
                "WebdriverIO with Appium",
                "Mocha, Jasmine or Jest",
                "before/after hooks",
                "try/catch blocks",
            ),
            Self::CSharp => (
                "the Appium.WebDriver NuGet package",
                "NUnit or MSTest",
                "setup and teardown methods",
                "try/catch blocks",
            ),
            Self::Ruby => (
                "the appium_lib gem",
                "RSpec or Test::Unit",
                "setup and teardown methods",
                "begin/rescue blocks",
            ),
            Self::Robot => (
                "AppiumLibrary",
                "Robot Framework sections (Settings, Variables, Keywords, Test Cases)",
                "Test Setup and Test Teardown",
                "appropriate keywords",
            ),
        };
        format!(
            "You are an expert in mobile app test automation with Appium and {name}.\n\
             Generate a complete, working {name} test script that:\n\
             1. Uses {client}\n\
             2. Is structured with {runner}\n\
             3. Includes proper {setup}\n\
             4. Implements the test goal provided\n\
             5. Includes comments explaining key sections\n\
             6. Handles errors with {errors}\n\n\
             Return the script in a single fenced code block. It should be ready to run \
             with minimal modification.",
            name = self.display_name(),
        )
    }
}

impl std::fmt::Display for ScriptLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for ScriptLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Self::Python),
            "java" => Ok(Self::Java),
            "javascript" | "js" | "nodejs" | "node" => Ok(Self::JavaScript),
            "csharp" | "c#" | "dotnet" | "cs" => Ok(Self::CSharp),
            "ruby" | "rb" => Ok(Self::Ruby),
            "robot" | "robotframework" => Ok(Self::Robot),
            other => Err(format!(
                "unsupported script language '{}'; supported: python, java, javascript, csharp, ruby, robot",
                other
            )),
        }
    }
}
