//! Guard templates wrapped around user scripts before they reach the engine.
//!
//! A script that throws is reported to the page console together with its
//! own source, and never takes the page down with it.

use crate::escape::json_escape;

/// Wrap an init script so it runs only in the top-level document (unless
/// `allow_nested` is set) and reports its own failures.
pub fn wrap_init_script(script: &str, allow_nested: bool) -> String {
    format!(
        "(() => {{\n\
         \x20 try {{\n\
         \x20   if (window.top === window.self || {allow_nested}) {{\n\
         \x20     {script}\n\
         \x20   }}\n\
         \x20 }} catch (e) {{\n\
         \x20   console.error('[Webview]', 'An error occurred whilst evaluating init script:', \"{escaped}\", e);\n\
         \x20 }}\n\
         }})();",
        escaped = json_escape(script),
    )
}

/// Wrap a script passed to `eval` in a try/catch that reports failures.
pub fn wrap_eval_script(script: &str) -> String {
    format!(
        "try {{\n\
         \x20 {script}\n\
         }} catch (e) {{\n\
         \x20 console.error('[Webview]', 'An error occurred whilst evaluating script:', \"{escaped}\", e);\n\
         }}",
        escaped = json_escape(script),
    )
}
