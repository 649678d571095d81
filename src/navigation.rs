use serde::{Deserialize, Serialize};

use crate::slides::TOTAL_SLIDES;

/// Minimum horizontal travel, in device-independent pixels, for a swipe to
/// count as navigation.
pub const SWIPE_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickTarget {
	Next,
	Previous,
}

/// Viewer input as reported by the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InputEvent {
	Key {
		key: String,
	},
	/// Primary contact x positions at gesture start and end. Either may be
	/// missing when the gesture was a tap without movement.
	Swipe {
		start_x: Option<f64>,
		end_x: Option<f64>,
	},
	Click {
		target: ClickTarget,
	},
	Jump {
		index: usize,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
	Next,
	Previous,
}

/// Classifies a horizontal swipe. `start_x - end_x` must exceed the threshold
/// in either direction; travel of exactly the threshold is ignored.
pub fn classify_swipe(start_x: f64, end_x: f64) -> Option<SwipeDirection> {
	let distance = start_x - end_x;
	if distance > SWIPE_THRESHOLD {
		Some(SwipeDirection::Next)
	} else if distance < -SWIPE_THRESHOLD {
		Some(SwipeDirection::Previous)
	} else {
		None
	}
}

#[derive(Debug, Clone, Default)]
pub struct NavigationController {
	index: usize,
}

impl NavigationController {
	pub fn new() -> Self {
		Self { index: 0 }
	}

	pub fn index(&self) -> usize {
		self.index
	}

	pub fn is_first(&self) -> bool {
		self.index == 0
	}

	pub fn is_last(&self) -> bool {
		self.index == TOTAL_SLIDES - 1
	}

	/// One-based position, e.g. `"3 / 15"`.
	pub fn label(&self) -> String {
		format!("{} / {}", self.index + 1, TOTAL_SLIDES)
	}

	pub fn go_next(&mut self) {
		if self.index < TOTAL_SLIDES - 1 {
			self.index += 1;
		}
	}

	pub fn go_previous(&mut self) {
		if self.index > 0 {
			self.index -= 1;
		}
	}

	pub fn jump(&mut self, index: usize) {
		self.index = index.min(TOTAL_SLIDES - 1);
	}

	/// Applies an input event and reports whether the index changed.
	pub fn handle(&mut self, event: &InputEvent) -> bool {
		let before = self.index;

		match event {
			InputEvent::Key { key } => match key.as_str() {
				"ArrowRight" => self.go_next(),
				"ArrowLeft" => self.go_previous(),
				_ => {}
			},
			InputEvent::Swipe {
				start_x: Some(start),
				end_x: Some(end),
			} => match classify_swipe(*start, *end) {
				Some(SwipeDirection::Next) => self.go_next(),
				Some(SwipeDirection::Previous) => self.go_previous(),
				None => {}
			},
			InputEvent::Swipe { .. } => {}
			InputEvent::Click { target } => match target {
				ClickTarget::Next => self.go_next(),
				ClickTarget::Previous => self.go_previous(),
			},
			InputEvent::Jump { index } => self.jump(*index),
		}

		before != self.index
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn at(index: usize) -> NavigationController {
		let mut nav = NavigationController::new();
		nav.jump(index);
		nav
	}

	#[test]
	fn test_next_and_previous_clamp_for_every_index() {
		for i in 0..TOTAL_SLIDES {
			let mut nav = at(i);
			nav.go_next();
			assert_eq!(nav.index(), (i + 1).min(TOTAL_SLIDES - 1));

			let mut nav = at(i);
			nav.go_previous();
			assert_eq!(nav.index(), i.saturating_sub(1));
		}
	}

	#[test]
	fn test_jump_clamps_out_of_range() {
		let nav = at(99);
		assert_eq!(nav.index(), TOTAL_SLIDES - 1);
		assert!(nav.is_last());
		assert_eq!(nav.label(), "15 / 15");
	}

	#[test]
	fn test_swipe_threshold_is_exclusive() {
		assert_eq!(classify_swipe(100.0, 49.0), Some(SwipeDirection::Next));
		assert_eq!(classify_swipe(100.0, 50.0), None);
		assert_eq!(classify_swipe(50.0, 100.0), None);
		assert_eq!(classify_swipe(49.0, 100.0), Some(SwipeDirection::Previous));
		assert_eq!(classify_swipe(10.0, 10.0), None);
	}

	#[test]
	fn test_handle_maps_inputs() {
		let mut nav = NavigationController::new();

		assert!(nav.handle(&InputEvent::Key {
			key: "ArrowRight".into()
		}));
		assert_eq!(nav.index(), 1);

		assert!(!nav.handle(&InputEvent::Key { key: "Enter".into() }));

		assert!(nav.handle(&InputEvent::Swipe {
			start_x: Some(300.0),
			end_x: Some(100.0),
		}));
		assert_eq!(nav.index(), 2);

		assert!(!nav.handle(&InputEvent::Swipe {
			start_x: Some(300.0),
			end_x: None,
		}));

		assert!(nav.handle(&InputEvent::Click {
			target: ClickTarget::Previous
		}));
		assert_eq!(nav.index(), 1);

		assert!(nav.handle(&InputEvent::Key {
			key: "ArrowLeft".into()
		}));
		assert!(!nav.handle(&InputEvent::Key {
			key: "ArrowLeft".into()
		}));
		assert!(nav.is_first());
	}

	#[test]
	fn test_input_event_json() {
		let event: InputEvent =
			serde_json::from_str(r#"{"kind":"swipe","start_x":10.5,"end_x":200}"#).unwrap();
		assert_eq!(
			event,
			InputEvent::Swipe {
				start_x: Some(10.5),
				end_x: Some(200.0)
			}
		);

		let event: InputEvent =
			serde_json::from_str(r#"{"kind":"click","target":"next"}"#).unwrap();
		assert_eq!(
			event,
			InputEvent::Click {
				target: ClickTarget::Next
			}
		);
	}
}
