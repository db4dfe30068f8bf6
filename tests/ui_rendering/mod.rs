
mod chat_flow_test;
mod settings_panel_test;
mod timeline_scroll_test;
