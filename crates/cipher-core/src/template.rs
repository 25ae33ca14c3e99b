//! Starter file set for new projects.

use crate::types::{FileEntry, FileMap};

/// File selected when a project is opened, if it exists.
pub const DEFAULT_ACTIVE_FILE: &str = "/App.js";

const APP_JS: &str = r#"import React from 'react';
import './styles.css';

export default function App() {
  return (
    <div className="App">
      <h1>Welcome to CipherStudio!</h1>
      <h2>Start editing to see some magic happen!</h2>
    </div>
  );
}"#;

const STYLES_CSS: &str = r#"body {
  font-family: sans-serif;
  -webkit-font-smoothing: auto;
  -moz-font-smoothing: auto;
  -moz-osx-font-smoothing: grayscale;
  font-smoothing: auto;
  text-rendering: optimizeLegibility;
  font-smooth: always;
  -webkit-tap-highlight-color: transparent;
  -webkit-touch-callout: none;
}

.App {
  margin: 20px;
  text-align: center;
}"#;

const INDEX_JS: &str = r#"import React, { StrictMode } from "react";
import { createRoot } from "react-dom/client";
import App from "./App";

const root = createRoot(document.getElementById("root"));
root.render(
  <StrictMode>
    <App />
  </StrictMode>
);"#;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <title>Parcel Sandbox</title>
    <meta charset="UTF-8" />
  </head>
  <body>
    <div id="root"></div>
    <script src="../index.js"></script>
  </body>
</html>"#;

const PACKAGE_JSON: &str = r#"{
  "name": "react-app",
  "version": "1.0.0",
  "description": "",
  "main": "index.js",
  "dependencies": {
    "react": "18.2.0",
    "react-dom": "18.2.0"
  }
}"#;

/// A minimal runnable React app. Every file is visible.
pub fn default_files() -> FileMap {
    [
        ("/App.js", APP_JS),
        ("/styles.css", STYLES_CSS),
        ("/index.js", INDEX_JS),
        ("/public/index.html", INDEX_HTML),
        ("/package.json", PACKAGE_JSON),
    ]
    .into_iter()
    .map(|(path, content)| (path.to_string(), FileEntry::visible(content)))
    .collect()
}

/// Content given to a freshly created file: one comment line naming it.
pub fn placeholder_content(path: &str) -> String {
    format!("// {path}\n")
}
