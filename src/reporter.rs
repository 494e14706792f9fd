use serde::Serialize;

use crate::ws::WsEvent;

/// Emit a stream event as a single JSON line to stdout.
pub fn report_event(event: &WsEvent) {
    if let Some(line) = json_line(event) {
        println!("{line}");
    }
}

/// Emit any response as pretty-printed JSON to stdout.
pub fn report_pretty<T: Serialize + ?Sized>(value: &T) {
    if let Ok(json) = serde_json::to_string_pretty(value) {
        println!("{json}");
    }
}

fn json_line(event: &WsEvent) -> Option<String> {
    serde_json::to_string(event).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventRegistry;

    #[test]
    fn event_line_is_single_line_json() {
        let frame = br#"{"type":"tx","data":{"tx_type":"transfer","wallet":"0xabc","amount_usd":"12.5"}}"#;
        let event = WsEvent::from_slice(frame, EventRegistry::standard()).unwrap();
        let line = json_line(&event).unwrap();
        assert!(!line.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["type"], "tx");
        assert_eq!(value["data"]["wallet"], "0xabc");
        assert_eq!(value["data"]["amount_usd"], 12.5);
    }
}
