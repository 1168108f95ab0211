//! Built-in starter written when no `--example` is given
//!
//! Two apps sharing one internal package, wired the way turbo expects: npm
//! style `workspaces` in the root manifest and a `tasks` pipeline.

use crate::core::error::{ResultExt, ToolResult};
use std::fs;
use std::path::{Path, PathBuf};

const ROOT_PACKAGE_JSON: &str = r#"{
  "name": "my-turborepo",
  "private": true,
  "scripts": {
    "build": "turbo run build",
    "dev": "turbo run dev",
    "lint": "turbo run lint"
  },
  "devDependencies": {
    "turbo": "latest"
  },
  "workspaces": [
    "apps/*",
    "packages/*"
  ]
}
"#;

const TURBO_JSON: &str = r#"{
  "$schema": "https://turbo.build/schema.json",
  "tasks": {
    "build": {
      "dependsOn": ["^build"],
      "outputs": ["dist/**"]
    },
    "dev": {
      "cache": false,
      "persistent": true
    },
    "lint": {
      "dependsOn": ["^lint"]
    }
  }
}
"#;

const README: &str = "# Turborepo starter

This monorepo contains:

- `apps/web`: a small app
- `apps/docs`: a second app
- `packages/ui`: a library shared by both apps

Run `turbo run build` to build everything, or `turbo run dev` to develop.
";

const WEB_PACKAGE_JSON: &str = r#"{
  "name": "web",
  "version": "0.0.0",
  "private": true,
  "scripts": {
    "build": "node build.js",
    "dev": "node index.js",
    "lint": "node --check index.js"
  },
  "dependencies": {
    "ui": "*"
  }
}
"#;

const DOCS_PACKAGE_JSON: &str = r#"{
  "name": "docs",
  "version": "0.0.0",
  "private": true,
  "scripts": {
    "build": "node build.js",
    "dev": "node index.js",
    "lint": "node --check index.js"
  },
  "dependencies": {
    "ui": "*"
  }
}
"#;

const APP_INDEX_JS: &str = r#"const { greet } = require("ui");

console.log(greet(require("./package.json").name));
"#;

const APP_BUILD_JS: &str = r#"const fs = require("fs");

fs.mkdirSync("dist", { recursive: true });
fs.copyFileSync("index.js", "dist/index.js");
"#;

const UI_PACKAGE_JSON: &str = r#"{
  "name": "ui",
  "version": "0.0.0",
  "private": true,
  "main": "index.js",
  "scripts": {
    "lint": "node --check index.js"
  }
}
"#;

const UI_INDEX_JS: &str = r#"exports.greet = (name) => `Hello from ${name}`;
"#;

/// Relative path and contents of every starter file
pub const FILES: &[(&str, &str)] = &[
  ("package.json", ROOT_PACKAGE_JSON),
  ("turbo.json", TURBO_JSON),
  ("README.md", README),
  ("apps/web/package.json", WEB_PACKAGE_JSON),
  ("apps/web/index.js", APP_INDEX_JS),
  ("apps/web/build.js", APP_BUILD_JS),
  ("apps/docs/package.json", DOCS_PACKAGE_JSON),
  ("apps/docs/index.js", APP_INDEX_JS),
  ("apps/docs/build.js", APP_BUILD_JS),
  ("packages/ui/package.json", UI_PACKAGE_JSON),
  ("packages/ui/index.js", UI_INDEX_JS),
];

/// Write the starter into `root`, returning the files written
pub fn write_starter(root: &Path) -> ToolResult<Vec<PathBuf>> {
  let mut written = Vec::with_capacity(FILES.len());
  for (rel, contents) in FILES {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    written.push(PathBuf::from(rel));
  }
  Ok(written)
}
