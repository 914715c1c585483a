//! Default TOML config template with inline documentation comments.

pub(crate) fn default_config_toml() -> &'static str {
    r##"# Lumen Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[window]
# title = "Lumen"
# width = 800            # 1-16384
# height = 600           # 1-16384
# size_hint = "none"     # none, min, max, fixed

[content]
# url = "https://example.com"   # wins over html
# html = "<h1>Hello</h1>"

[engine]
# developer_tools = false
# async_mode = false     # run the event loop on its own thread
# library_path = "/usr/local/lib/libwebview.so"

[logging]
# level = "info"         # trace, debug, info, warn, error
"##
}
