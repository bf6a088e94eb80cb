use serde_json::Value;

use crate::types::*;

/// Collect `(path, old, new)` for every leaf that differs between two JSON
/// trees. Keys only present in `previous` are ignored.
pub(crate) fn diff_json(
    previous: &Value,
    current: &Value,
    path_prefix: &str,
    changes: &mut Vec<(String, Value, Value)>,
) {
    match (previous, current) {
        (Value::Object(prev_map), Value::Object(curr_map)) => {
            for (key, curr_val) in curr_map {
                let path = if path_prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{path_prefix}.{key}")
                };
                match prev_map.get(key) {
                    Some(prev_val) => diff_json(prev_val, curr_val, &path, changes),
                    None => {
                        if curr_val.is_object() {
                            diff_json(&Value::Object(serde_json::Map::new()), curr_val, &path, changes);
                        } else {
                            changes.push((path, Value::Null, curr_val.clone()));
                        }
                    }
                }
            }
        }
        (prev, curr) if prev != curr => {
            changes.push((path_prefix.to_string(), prev.clone(), curr.clone()));
        }
        _ => {}
    }
}

/// Events describing how the entity state moved between two refreshes.
pub(crate) fn state_events(prev: &ClimateState, next: &ClimateState) -> Vec<Event> {
    let mut events = Vec::new();

    if prev.available != next.available {
        events.push(Event::AvailabilityChanged {
            available: next.available,
        });
    }
    if prev.mode != next.mode {
        events.push(Event::ModeChanged { mode: next.mode });
    }
    if prev.action != next.action {
        events.push(Event::ActionChanged {
            action: next.action,
        });
    }
    if prev.fan_mode != next.fan_mode {
        events.push(Event::FanModeChanged {
            fan_mode: next.fan_mode,
        });
    }
    if prev.current_temperature != next.current_temperature {
        events.push(Event::CurrentTemperatureChanged {
            temp: next.current_temperature,
        });
    }
    if prev.target_temperature != next.target_temperature {
        events.push(Event::TargetTemperatureChanged {
            temp: next.target_temperature,
        });
    }
    if prev.min_temp != next.min_temp || prev.max_temp != next.max_temp {
        events.push(Event::SetpointRangeChanged {
            min: next.min_temp,
            max: next.max_temp,
        });
    }
    if prev.power_consumption != next.power_consumption {
        events.push(Event::PowerChanged {
            power: next.power_consumption,
        });
    }

    events
}
