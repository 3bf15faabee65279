//! Browser-backed implementations of the editor's collaborator traits.

use js_sys::{Array, Function};
use log::{Level, LevelFilter, Metadata, Record};
use pd_core::ElementId;
use pd_editor::{Clock, ComputedFont, FormatCommand, FormatOutcome, RichTextEditor, TextRange};
use serde::Deserialize;
use wasm_bindgen::JsValue;

// ─── Clock ───────────────────────────────────────────────────────────────

pub struct JsClock;

impl Clock for JsClock {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

// ─── Console logger ──────────────────────────────────────────────────────

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from_str(&format!(
            "[{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        ));
        match record.level() {
            Level::Error => web_sys::console::error_1(&msg),
            Level::Warn => web_sys::console::warn_1(&msg),
            _ => web_sys::console::log_1(&msg),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Route `log` records to the browser console. Later calls are no-ops.
pub fn install_logger(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

// ─── Rich text bridge ────────────────────────────────────────────────────

/// Text range as exchanged with the page script.
#[derive(Debug, Deserialize)]
struct RangeDto {
    element: String,
    start: u32,
    end: u32,
}

impl RangeDto {
    fn into_range(self) -> Option<TextRange> {
        ElementId::lookup(&self.element).map(|element| TextRange {
            element,
            start: self.start,
            end: self.end,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct OutcomeDto {
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    range: Option<RangeDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FontDto {
    family: String,
    size_px: f64,
}

pub(crate) fn range_json(range: Option<&TextRange>) -> String {
    match range {
        Some(r) => serde_json::json!({
            "element": r.element.to_string(),
            "start": r.start,
            "end": r.end,
        })
        .to_string(),
        None => "null".to_string(),
    }
}

/// Parse the script's reply to a format command. Malformed replies count
/// as "nothing changed".
pub(crate) fn parse_outcome(reply: Option<String>) -> FormatOutcome {
    let Some(text) = reply else {
        return FormatOutcome::default();
    };
    match serde_json::from_str::<OutcomeDto>(&text) {
        Ok(dto) => FormatOutcome {
            html: dto.html,
            range: dto.range.and_then(RangeDto::into_range),
        },
        Err(e) => {
            log::warn!("pd-wasm: bad format reply: {e}");
            FormatOutcome::default()
        }
    }
}

pub(crate) fn parse_font(reply: Option<String>) -> Option<ComputedFont> {
    let dto: FontDto = serde_json::from_str(&reply?).ok()?;
    Some(ComputedFont {
        family: ComputedFont::primary_family(&dto.family),
        size_px: dto.size_px,
    })
}

/// Forwards formatting to the page's `contenteditable` handling.
///
/// `exec(rangeJson, name, value)` applies a command and returns a JSON
/// string `{"html":..., "range":...}`. `computedFont(rangeJson)` returns
/// `{"family":..., "sizePx":...}` for the caret position.
pub struct JsRichText {
    exec: Function,
    computed_font: Function,
}

impl JsRichText {
    pub fn new(exec: Function, computed_font: Function) -> Self {
        Self {
            exec,
            computed_font,
        }
    }
}

impl RichTextEditor for JsRichText {
    fn exec(&mut self, range: Option<&TextRange>, command: &FormatCommand) -> FormatOutcome {
        let (name, value) = command.parts();
        let args = Array::new();
        args.push(&JsValue::from_str(&range_json(range)));
        args.push(&JsValue::from_str(name));
        args.push(&value.map(JsValue::from_str).unwrap_or(JsValue::NULL));
        match self.exec.apply(&JsValue::NULL, &args) {
            Ok(reply) => parse_outcome(reply.as_string()),
            Err(e) => {
                log::warn!("pd-wasm: format command `{name}` threw: {e:?}");
                FormatOutcome::default()
            }
        }
    }

    fn computed_font(&self, range: &TextRange) -> Option<ComputedFont> {
        let arg = JsValue::from_str(&range_json(Some(range)));
        let reply = self.computed_font.call1(&JsValue::NULL, &arg).ok()?;
        parse_font(reply.as_string())
    }
}
