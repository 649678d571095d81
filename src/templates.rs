use anyhow::{anyhow, Result};

use crate::logo::ACCEPTED_CONTENT_TYPES;
use crate::slides::{self, TOTAL_SLIDES};

pub const STYLESHEET: &str = include_str!("../templates/assets/style.css");
pub const SCRIPT: &str = include_str!("../templates/assets/deck.js");

/// Live view state needed to render the viewer page.
pub struct ViewerContext<'a> {
	pub index: usize,
	/// Logo `src` for the live view, usually a cache-busted `/logo` URL.
	pub logo_src: Option<&'a str>,
	pub exporting: bool,
	pub progress: u8,
}

pub struct TemplateEngine {
	viewer_template: String,
	print_template: String,
}

impl TemplateEngine {
	pub fn new() -> Self {
		Self {
			viewer_template: include_str!("../templates/deck.html").to_string(),
			print_template: include_str!("../templates/print.html").to_string(),
		}
	}

	/// Slide body wrapped in its container, as swapped in by the viewer script.
	pub fn render_fragment(&self, index: usize) -> Result<String> {
		let slide = slides::slide(index).ok_or_else(|| anyhow!("No slide at index {}", index))?;
		Ok(format!(
			"<section class=\"slide slide-{}\" data-index=\"{}\">\n{}\n</section>",
			slide.kind.class_name(),
			index,
			slide.body()
		))
	}

	pub fn render_viewer(&self, ctx: &ViewerContext) -> Result<String> {
		let slide = slides::slide(ctx.index)
			.ok_or_else(|| anyhow!("No slide at index {}", ctx.index))?;
		let fragment = self.render_fragment(ctx.index)?;

		let export_label = if ctx.exporting {
			format!("{}%", ctx.progress)
		} else {
			"PDF".to_string()
		};

		let html = self
			.viewer_template
			.replace("{{PAGE_TITLE}}", &escape(slide.title))
			.replace("{{STYLESHEET}}", "/assets/style.css")
			.replace("{{SCRIPT}}", "/assets/deck.js")
			.replace("{{LOGO}}", &self.render_logo_control(ctx.logo_src))
			.replace("{{ACCEPT}}", ACCEPTED_CONTENT_TYPES)
			.replace("{{SLIDE}}", &fragment)
			.replace("{{POSITION}}", &(ctx.index + 1).to_string())
			.replace("{{TOTAL}}", &TOTAL_SLIDES.to_string())
			.replace("{{PREV_DISABLED}}", disabled(ctx.index == 0))
			.replace("{{NEXT_DISABLED}}", disabled(ctx.index == TOTAL_SLIDES - 1))
			.replace("{{EXPORT_DISABLED}}", disabled(ctx.exporting))
			.replace("{{EXPORT_LABEL}}", &export_label);

		Ok(html)
	}

	/// Standalone 1920x1080 document for one slide, with the static backdrop
	/// and the logo overlay. `logo_src` should be self-contained (a `data:`
	/// URI) since the document is loaded from disk.
	pub fn render_print(&self, index: usize, logo_src: Option<&str>) -> Result<String> {
		let slide = slides::slide(index).ok_or_else(|| anyhow!("No slide at index {}", index))?;

		let logo_html = match logo_src {
			Some(src) => format!(
				"<div class=\"print-logo\"><img src=\"{}\" alt=\"TalentlyX\"></div>",
				escape(src)
			),
			None => String::new(),
		};

		let html = self
			.print_template
			.replace("{{PAGE_TITLE}}", &escape(slide.title))
			.replace("{{STYLES}}", STYLESHEET)
			.replace("{{SLIDE}}", &self.render_fragment(index)?)
			.replace("{{LOGO}}", &logo_html);

		Ok(html)
	}

	fn render_logo_control(&self, logo_src: Option<&str>) -> String {
		match logo_src {
			Some(src) => format!(
				"<div class=\"logo-current\" id=\"logo-trigger\"><img src=\"{}\" alt=\"Logo\"></div>",
				escape(src)
			),
			None => "<button class=\"logo-upload\" id=\"logo-trigger\">&#8679; <span>Upload Logo</span></button>"
				.to_string(),
		}
	}
}

impl Default for TemplateEngine {
	fn default() -> Self {
		Self::new()
	}
}

fn disabled(flag: bool) -> &'static str {
	if flag {
		" disabled"
	} else {
		""
	}
}

pub fn escape(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			_ => out.push(c),
		}
	}
	out
}
