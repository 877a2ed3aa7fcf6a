use serde::Serialize;

/// Wraps `body` so it runs against the document addressed by `path`.
///
/// Inside `body`, `document` and `window` are the target frame's. The result
/// always comes back as a JSON string envelope `{ok, value}` / `{ok, error}`
/// so thrown exceptions and cross-origin frames surface as plain errors.
pub(crate) fn in_frame(path: &[usize], body: &str) -> String {
    let path = serde_json::to_string(path).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"(() => {{
  try {{
    let __win = window;
    for (const i of {path}) {{
      __win = __win.frames[i];
      if (!__win) throw new Error('frame detached');
    }}
    const __doc = __win.document;
    if (!__doc) throw new Error('frame document not accessible');
    const __value = ((document, window) => {{ {body} }})(__doc, __win);
    return JSON.stringify({{ ok: true, value: __value === undefined ? null : __value }});
  }} catch (e) {{
    return JSON.stringify({{ ok: false, error: String((e && e.message) || e) }});
  }}
}})()"#
    )
}

pub(crate) fn literal<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

pub(crate) const LIST_FRAMES: &str = r#"
  const out = [];
  const walk = (win, path) => {
    let name = '';
    try { name = win.name || ''; } catch (e) {}
    out.push({ path, name });
    let n = 0;
    try { n = win.frames.length; } catch (e) {}
    for (let i = 0; i < n; i++) walk(win.frames[i], path.concat([i]));
  };
  walk(window, []);
  return out;
"#;

pub(crate) const READY_FLAG: &str = "return window._scraperReady === true;";

pub(crate) const BODY_TEXT: &str = "return document.body ? document.body.innerText : '';";

pub(crate) fn count(selector: &str) -> String {
    format!("return document.querySelectorAll({}).length;", literal(selector))
}

pub(crate) fn text_of(selector: &str) -> String {
    format!(
        "const el = document.querySelector({}); return el ? el.innerText : null;",
        literal(selector)
    )
}

pub(crate) fn texts_of(selectors: &[&str]) -> String {
    format!(
        "const out = []; for (const s of {}) {{ for (const el of document.querySelectorAll(s)) out.push(el.innerText || ''); }} return out;",
        literal(selectors)
    )
}

pub(crate) fn click(selector: &str) -> String {
    format!(
        "const el = document.querySelector({}); if (!el) return false; el.click(); return true;",
        literal(selector)
    )
}

pub(crate) fn click_containing(selector: &str, tokens: &[String]) -> String {
    format!(
        r#"const tokens = {}.map(t => t.toLowerCase());
  const els = Array.from(document.querySelectorAll({}));
  const target = els.find(el => {{
    const txt = (el.innerText || '').toLowerCase();
    return tokens.length === 0 || tokens.some(t => txt.includes(t));
  }});
  if (!target) return false;
  target.click();
  return true;"#,
        literal(tokens),
        literal(selector)
    )
}

pub(crate) fn click_nth(selector: &str, index: usize) -> String {
    format!(
        "const el = document.querySelectorAll({})[{index}]; if (!el) return false; el.click(); return true;",
        literal(selector)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_are_json_escaped() {
        let js = count(r#"input[value="OK"]"#);
        assert!(js.contains(r#""input[value=\"OK\"]""#));
    }

    #[test]
    fn frame_path_is_embedded() {
        let js = in_frame(&[2, 0], BODY_TEXT);
        assert!(js.contains("for (const i of [2,0])"));
        assert!(js.contains("document.body.innerText"));
    }
}
