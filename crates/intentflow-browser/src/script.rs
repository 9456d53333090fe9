//! Generated Playwright runner scripts.
//!
//! Each step runs in its own Node.js process. Continuity between steps comes
//! from the session's storage state file and the last page URL, both restored
//! when the next script starts.

use anyhow::Result;
use intentflow_models::IntentStep;
use serde_json::json;

use crate::runtime::RESULT_MARKER;
use crate::session::BrowserSession;

/// Script for one step: the snippet as user code, or the structured action
/// when the step carries no snippet.
pub(crate) fn build_step_script(
    session: &BrowserSession,
    start_url: Option<&str>,
    step: &IntentStep,
    timeout_ms: u64,
) -> Result<String> {
    let step_literal = serde_json::to_string(&json!({
        "name": step.name,
        "action": step.action,
        "selector": step.selector,
        "value": step.value,
        "timeoutMs": step.timeout.unwrap_or(timeout_ms),
    }))?;

    let mut script = prelude(session, start_url)?;
    script.push_str(&format!("const step = {step_literal};\n"));
    script.push_str("page.setDefaultTimeout(step.timeoutMs);\n\n");

    if step.snippet.trim().is_empty() {
        push_action_runner(&mut script);
    }

    script.push_str("try {\n");
    script.push_str("  if (session.startUrl) {\n");
    script.push_str("    await page.goto(session.startUrl, { waitUntil: 'load' });\n");
    script.push_str("  }\n");
    if step.snippet.trim().is_empty() {
        script.push_str("  const result = await runAction(step);\n");
    } else {
        script.push_str("  const __stepMain = async (page, context, browser, step) => {\n");
        script.push_str(&indent_code(&step.snippet, 4));
        script.push_str("\n  };\n");
        script.push_str("  const result = await __stepMain(page, context, browser, step);\n");
    }
    script.push_str("  await context.storageState({ path: storageStatePath });\n");
    script.push_str("  emit({ success: true, result: result ?? null, url: page.url() });\n");
    push_epilogue(&mut script);

    Ok(script)
}

/// Script that restores the session page and captures it to `target`.
pub(crate) fn build_screenshot_script(
    session: &BrowserSession,
    start_url: Option<&str>,
    target: &str,
) -> Result<String> {
    let target_literal = serde_json::to_string(target)?;

    let mut script = prelude(session, start_url)?;
    script.push_str(&format!("const target = {target_literal};\n\n"));
    script.push_str("try {\n");
    script.push_str("  if (session.startUrl) {\n");
    script.push_str("    await page.goto(session.startUrl, { waitUntil: 'load' });\n");
    script.push_str("  }\n");
    script.push_str("  await fs.promises.mkdir(path.dirname(target), { recursive: true });\n");
    script.push_str("  await page.screenshot({ path: target, fullPage: false });\n");
    script.push_str("  emit({ success: true, result: { path: target }, url: page.url() });\n");
    push_epilogue(&mut script);

    Ok(script)
}

fn prelude(session: &BrowserSession, start_url: Option<&str>) -> Result<String> {
    let session_literal = serde_json::to_string(&json!({
        "id": session.id,
        "headless": session.headless,
        "profileDir": session.profile_dir,
        "artifactsDir": session.artifacts_dir,
        "startUrl": start_url,
    }))?;

    let mut script = String::new();
    script.push_str("import fs from 'node:fs';\n");
    script.push_str("import path from 'node:path';\n\n");
    script.push_str(&format!("const RESULT_MARKER = '{RESULT_MARKER}';\n"));
    script.push_str(&format!("const session = {session_literal};\n"));
    script.push_str(
        "const storageStatePath = path.join(session.profileDir, 'storage-state.json');\n",
    );
    script.push_str("const emit = (payload) => {\n");
    script.push_str("  process.stdout.write(`${RESULT_MARKER}${JSON.stringify(payload)}\\n`);\n");
    script.push_str("};\n");
    script.push_str("const describe = (error) => (error && error.message ? error.message : String(error));\n");
    script.push_str("await fs.promises.mkdir(session.profileDir, { recursive: true });\n");
    script.push_str("await fs.promises.mkdir(session.artifactsDir, { recursive: true });\n\n");

    script.push_str("let chromium;\n");
    script.push_str("try {\n");
    script.push_str("  ({ chromium } = await import('playwright'));\n");
    script.push_str("} catch (error) {\n");
    script.push_str("  process.stderr.write(String(error && error.stack ? error.stack : error) + '\\n');\n");
    script.push_str("  emit({ success: false, error: describe(error) });\n");
    script.push_str("  process.exit(1);\n");
    script.push_str("}\n\n");

    script.push_str("const browser = await chromium.launch({ headless: session.headless });\n");
    script.push_str("const contextOptions = {};\n");
    script.push_str("if (fs.existsSync(storageStatePath)) {\n");
    script.push_str("  contextOptions.storageState = storageStatePath;\n");
    script.push_str("}\n");
    script.push_str("const context = await browser.newContext(contextOptions);\n");
    script.push_str("const page = await context.newPage();\n");

    Ok(script)
}

fn push_action_runner(script: &mut String) {
    script.push_str("async function runAction(step) {\n");
    script.push_str("  const action = (step.action ?? '').trim().toLowerCase();\n");
    script.push_str("  const target = () => page.locator(step.selector).first();\n");
    script.push_str("  switch (action) {\n");
    script.push_str("    case 'navigate':\n");
    script.push_str("    case 'goto':\n");
    script.push_str("    case 'open':\n");
    script.push_str("    case 'visit': {\n");
    script.push_str("      await page.goto(step.value ?? step.selector, { waitUntil: 'load' });\n");
    script.push_str("      return { url: page.url() };\n");
    script.push_str("    }\n");
    script.push_str("    case 'click': {\n");
    script.push_str("      await target().click();\n");
    script.push_str("      return null;\n");
    script.push_str("    }\n");
    script.push_str("    case 'fill':\n");
    script.push_str("    case 'type': {\n");
    script.push_str("      await target().fill(step.value ?? '');\n");
    script.push_str("      return null;\n");
    script.push_str("    }\n");
    script.push_str("    case 'press': {\n");
    script.push_str("      if (step.selector) {\n");
    script.push_str("        await target().press(step.value ?? 'Enter');\n");
    script.push_str("      } else {\n");
    script.push_str("        await page.keyboard.press(step.value ?? 'Enter');\n");
    script.push_str("      }\n");
    script.push_str("      return null;\n");
    script.push_str("    }\n");
    script.push_str("    case 'select': {\n");
    script.push_str("      await target().selectOption(step.value ?? '');\n");
    script.push_str("      return null;\n");
    script.push_str("    }\n");
    script.push_str("    case 'wait':\n");
    script.push_str("    case 'wait_for': {\n");
    script.push_str("      if (step.selector) {\n");
    script.push_str("        await target().waitFor({ state: 'visible' });\n");
    script.push_str("      } else {\n");
    script.push_str("        await page.waitForTimeout(Number(step.value) || 1000);\n");
    script.push_str("      }\n");
    script.push_str("      return null;\n");
    script.push_str("    }\n");
    script.push_str("    case 'extract':\n");
    script.push_str("    case 'extract_text': {\n");
    script.push_str("      return { text: await target().textContent() };\n");
    script.push_str("    }\n");
    script.push_str("    default:\n");
    script.push_str("      throw new Error(`Step '${step.name}' has no snippet and no supported action`);\n");
    script.push_str("  }\n");
    script.push_str("}\n\n");
}

fn push_epilogue(script: &mut String) {
    script.push_str("} catch (error) {\n");
    script.push_str("  process.stderr.write(String(error && error.stack ? error.stack : error) + '\\n');\n");
    script.push_str("  emit({ success: false, error: describe(error), url: page.url() });\n");
    script.push_str("  process.exitCode = 1;\n");
    script.push_str("} finally {\n");
    script.push_str("  await context.close().catch(() => {});\n");
    script.push_str("  await browser.close().catch(() => {});\n");
    script.push_str("}\n");
}

fn indent_code(code: &str, spaces: usize) -> String {
    let prefix = " ".repeat(spaces);
    code.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
