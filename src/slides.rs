//! Slide content for the proposal deck.
//!
//! Every slide is a pure render function looked up by index. The table length
//! is the single source of truth for the slide count used by navigation and
//! export.

pub const TOTAL_SLIDES: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideKind {
	Title,
	Content,
	Grid,
	Timeline,
	Pricing,
	ThankYou,
}

impl SlideKind {
	pub fn class_name(&self) -> &'static str {
		match self {
			SlideKind::Title => "title",
			SlideKind::Content => "content",
			SlideKind::Grid => "grid",
			SlideKind::Timeline => "timeline",
			SlideKind::Pricing => "pricing",
			SlideKind::ThankYou => "thankyou",
		}
	}
}

#[derive(Debug, Clone, Copy)]
pub struct Slide {
	pub title: &'static str,
	pub kind: SlideKind,
	render: fn() -> String,
}

impl Slide {
	pub fn body(&self) -> String {
		(self.render)()
	}
}

static SLIDES: [Slide; TOTAL_SLIDES] = [
	Slide { title: "Nabrah AI Voice Studio", kind: SlideKind::Title, render: title },
	Slide { title: "Executive Summary", kind: SlideKind::Content, render: executive_summary },
	Slide { title: "Platform Objectives", kind: SlideKind::Grid, render: objectives },
	Slide { title: "Key Features Overview", kind: SlideKind::Grid, render: features },
	Slide { title: "Text-to-Speech Studio", kind: SlideKind::Content, render: tts_studio },
	Slide { title: "Voice Cloning", kind: SlideKind::Content, render: voice_cloning },
	Slide { title: "Projects & Scripts", kind: SlideKind::Content, render: projects },
	Slide { title: "Developer Ecosystem", kind: SlideKind::Grid, render: developers },
	Slide { title: "Admin Dashboard", kind: SlideKind::Content, render: admin },
	Slide { title: "Investment & Cost", kind: SlideKind::Pricing, render: pricing },
	Slide { title: "Technical Architecture", kind: SlideKind::Content, render: architecture },
	Slide { title: "Project Timeline", kind: SlideKind::Timeline, render: timeline },
	Slide { title: "Terms & Conditions", kind: SlideKind::Content, render: terms },
	Slide { title: "Next Steps", kind: SlideKind::Timeline, render: next_steps },
	Slide { title: "Thank You", kind: SlideKind::ThankYou, render: thank_you },
];

pub fn slide(index: usize) -> Option<&'static Slide> {
	SLIDES.get(index)
}

pub fn all() -> &'static [Slide] {
	&SLIDES
}

fn heading(text: &str, accent: &str) -> String {
	format!("<h2 class=\"slide-heading accent-{}\">{}</h2>\n", accent, text)
}

fn card(class: &str, inner: &str) -> String {
	format!("<div class=\"glass-card {}\">\n{}\n</div>\n", class, inner)
}

fn bullets(items: &[&str]) -> String {
	let mut html = String::from("<ul class=\"bullets\">\n");
	for item in items {
		html.push_str(&format!("<li>{}</li>\n", item));
	}
	html.push_str("</ul>");
	html
}

fn title() -> String {
	r#"<div class="layout-center">
<h1 class="hero glow-text">Nabrah AI Voice Studio</h1>
<p class="hero-subtitle">Platform Development Proposal</p>
<div class="hero-footer">
<p class="muted">Prepared by TalentlyX</p>
<p class="accent-cyan small">26 November 2025</p>
</div>
</div>"#
		.to_string()
}

fn executive_summary() -> String {
	let mut html = String::from("<div class=\"layout-column narrow\">\n");
	html.push_str(&heading("Executive Summary", "gradient"));
	html.push_str(&card(
		"large-text",
		"<p>&ldquo;Nabrah seeks to build a modern <span class=\"accent-cyan strong\">AI Voice Studio</span> \
		 for Saudi dialect TTS, voice cloning, developer APIs, and script-based audio generation.\
		 <br><br>TalentlyX will deliver a full <span class=\"accent-purple strong\">ElevenLabs-style platform</span>, \
		 localized for Arabic, built with modern technology, and fully integrated with Nabrah's TTS capabilities.&rdquo;</p>",
	));
	html.push_str("</div>");
	html
}

fn objectives() -> String {
	const ITEMS: [&str; 7] = [
		"Build a complete production-ready AI Voice Studio",
		"Enable speech generation in Saudi dialects",
		"Offer high-fidelity Voice Cloning",
		"Manage scripts and long-form projects",
		"Provide robust Developer APIs",
		"Include tiered Subscription Models",
		"Full Arabic + English Support",
	];

	let mut html = String::from("<div class=\"layout-column narrow\">\n");
	html.push_str(&heading("Platform Objectives", "underline"));
	html.push_str("<div class=\"grid cols-2\">\n");
	for item in ITEMS {
		html.push_str(&card(
			"row",
			&format!("<span class=\"check\">&#10003;</span><span class=\"item\">{}</span>", item),
		));
	}
	html.push_str("</div>\n</div>");
	html
}

fn features() -> String {
	const FEATURES: [(&str, &str); 8] = [
		("TTS Studio", "Advanced Synthesis"),
		("Voice Cloning", "Instant Voice Copy"),
		("Projects &amp; Scripts", "Long-form Editing"),
		("Voice Library", "Saudi Dialects"),
		("Developer API", "Integration Ready"),
		("Pricing &amp; Plans", "Subscription Mgmt"),
		("Admin Dashboard", "Platform Control"),
		("Localization", "Arabic/English UI"),
	];

	let mut html = String::from("<div class=\"layout-column\">\n");
	html.push_str(&heading("Key Features Overview", "center"));
	html.push_str("<div class=\"grid cols-4\">\n");
	for (name, desc) in FEATURES {
		html.push_str(&card(
			"feature",
			&format!(
				"<div class=\"icon-bubble\"></div>\n<h3>{}</h3>\n<p class=\"muted small\">{}</p>",
				name, desc
			),
		));
	}
	html.push_str("</div>\n</div>");
	html
}

fn tts_studio() -> String {
	let mut html = String::from("<div class=\"layout-column narrow\">\n");
	html.push_str(&heading("Text-to-Speech Studio", "cyan"));
	html.push_str("<div class=\"grid cols-2\">\n<div class=\"stack\">\n");
	html.push_str(&card(
		"",
		&format!(
			"<h3 class=\"accent-cyan\">Core Generation</h3>\n{}",
			bullets(&[
				"Multi-paragraph TTS support",
				"Paragraph-by-paragraph granular generation",
				"High-fidelity real-time playback",
			])
		),
	));
	html.push_str(&card(
		"",
		&format!(
			"<h3 class=\"accent-cyan\">Audio Management</h3>\n{}",
			bullets(&[
				"Instant MP3/WAV download",
				"Audio merging (stitch paragraphs)",
				"Persistent generation history",
			])
		),
	));
	html.push_str("</div>\n<div class=\"player-mock\">\n");
	html.push_str("<div class=\"player-bar\"><span class=\"rec\"></span><span class=\"track\"></span><span class=\"muted small\">01:24</span></div>\n");
	html.push_str("<div class=\"waveform\">");
	// Deterministic bar heights so every capture of this slide is identical.
	for i in 0..30u32 {
		let height = 20 + (i * 37 + 11) % 80;
		html.push_str(&format!("<span style=\"height:{}%\"></span>", height));
	}
	html.push_str("</div>\n");
	html.push_str("<div class=\"text-lines\"><span style=\"width:75%\"></span><span style=\"width:100%\"></span><span style=\"width:83%\"></span></div>\n");
	html.push_str("<div class=\"transport\"><span class=\"small-btn\">&#9664;</span><span class=\"play-btn\">&#9654;</span><span class=\"small-btn\">&#9654;</span></div>\n");
	html.push_str("</div>\n</div>\n</div>");
	html
}

fn voice_cloning() -> String {
	const ROWS: [(&str, &str, &str); 3] = [
		("Sample Upload (&ge;1 min)", "WAV/MP3", "green"),
		("Voice Naming &amp; Categorization", "Metadata", "blue"),
		("Privacy Control", "Private/Public", "purple"),
	];

	let mut rows = String::new();
	for (label, tag, color) in ROWS {
		rows.push_str(&format!(
			"<div class=\"tag-row\"><span>{}</span><span class=\"tag tag-{}\">{}</span></div>\n",
			label, color, tag
		));
	}

	let mut html = String::from("<div class=\"layout-column narrow\">\n");
	html.push_str(&heading("Voice Cloning", "purple"));
	html.push_str("<div class=\"grid cols-3\">\n");
	html.push_str(&card(
		"span-2",
		&format!(
			"<h3>Instant &amp; Professional Cloning</h3>\n<p class=\"muted\">Empower users to create digital replicas of their voices with as little as 1 minute of audio.</p>\n{}",
			rows
		),
	));
	html.push_str(&card(
		"centered border-purple",
		"<div class=\"shield\">&#128737;</div>\n<h3>Admin Approval</h3>\n<p class=\"muted small\">Security workflow to prevent misuse. All clones must pass admin verification.</p>",
	));
	html.push_str("</div>\n</div>");
	html
}

fn projects() -> String {
	let mut html = String::from("<div class=\"layout-column narrow\">\n");
	html.push_str(&heading("Projects &amp; Scripts", "pink"));
	html.push_str("<div class=\"grid cols-2\">\n<div class=\"stack\">\n");
	html.push_str("<div class=\"panel panel-pink\"><h3>Unlimited Structure</h3><p class=\"muted\">Organize work into folders (Projects) containing multiple chapters (Scripts).</p></div>\n");
	html.push_str("<div class=\"panel panel-pink\"><h3>Editor Integration</h3><p class=\"muted\">Generate audio directly within the script editor. Highlight text &rarr; Generate.</p></div>\n");
	html.push_str("</div>\n<div class=\"stack\">\n");
	for item in ["Autosave &amp; Versioning", "Duplicate &amp; Template", "Bulk Delete &amp; Archive"] {
		html.push_str(&card("row", &format!("<span class=\"doc-icon\">&#128196;</span><span>{}</span>", item)));
	}
	html.push_str("</div>\n</div>\n</div>");
	html
}

fn developers() -> String {
	const ITEMS: [(&str, &str); 4] = [
		("API Keys", "Secure key management with scopes."),
		("Documentation", "Swagger/OpenAPI specs."),
		("Usage Logs", "Real-time quota tracking."),
		("Webhooks", "Async events for generation."),
	];

	let mut html = String::from("<div class=\"layout-column wide\">\n");
	html.push_str(&heading("Developer Ecosystem", "green"));
	html.push_str("<div class=\"grid cols-4\">\n");
	for (name, desc) in ITEMS {
		html.push_str(&format!(
			"<div class=\"panel panel-green\"><h3>{}</h3><p class=\"muted small\">{}</p></div>\n",
			name, desc
		));
	}
	html.push_str("</div>\n</div>");
	html
}

fn admin() -> String {
	const CONTROLS: [(&str, &str, &str); 4] = [
		("Voice Approvals", "Critical", "orange"),
		("User Credits &amp; Billing", "Mgmt", "gray"),
		("System Logs", "Audit", "gray"),
		("Content Moderation", "Safety", "red"),
	];
	const ACTIVITY: [u32; 12] = [30, 45, 35, 60, 50, 75, 60, 90, 80, 60, 75, 50];

	let mut list = String::from("<ul class=\"control-list\">\n");
	for (label, tag, color) in CONTROLS {
		list.push_str(&format!(
			"<li><span>{}</span><span class=\"tag tag-{}\">{}</span></li>\n",
			label, color, tag
		));
	}
	list.push_str("</ul>");

	let mut html = String::from("<div class=\"layout-column narrow\">\n");
	html.push_str(&heading("Admin Dashboard", "orange"));
	html.push_str("<div class=\"grid cols-2\">\n");
	html.push_str(&card(
		"",
		&format!("<h3 class=\"accent-orange\">Platform Control Center</h3>\n{}", list),
	));
	html.push_str("<div class=\"chart-panel\">\n<div class=\"mono muted small\">LIVE SYSTEM ACTIVITY</div>\n<div class=\"bar-chart\">");
	for h in ACTIVITY {
		html.push_str(&format!("<span style=\"height:{}%\"></span>", h));
	}
	html.push_str("</div>\n<div class=\"chart-axis muted small\"><span>00:00</span><span>12:00</span><span>24:00</span></div>\n</div>\n");
	html.push_str("</div>\n</div>");
	html
}

fn pricing() -> String {
	let mut html = String::from("<div class=\"layout-column slim\">\n");
	html.push_str(&heading("Investment &amp; Cost", "center"));
	html.push_str("<div class=\"grid cols-2\">\n");
	html.push_str(&card(
		"plan",
		&format!(
			"<h3>MVP Version</h3>\n<div class=\"price\">12,000 <span class=\"currency\">SAR</span></div>\n{}",
			bullets(&[
				"Core TTS Studio",
				"Basic Project Mgmt",
				"5 Pre-set Voices",
				"Essential Admin Panel",
			])
		),
	));
	html.push_str(&card(
		"plan plan-recommended",
		&format!(
			"<div class=\"ribbon\">RECOMMENDED</div>\n<h3 class=\"accent-cyan\">Full Platform</h3>\n<div class=\"price\">15,000 <span class=\"currency\">SAR</span></div>\n{}",
			bullets(&[
				"All MVP Features",
				"<span class=\"accent-cyan\">Voice Cloning</span>",
				"<span class=\"accent-cyan\">Developer API</span>",
				"Advanced Analytics",
				"Multi-user Teams",
			])
		),
	));
	html.push_str("</div>\n</div>");
	html
}

fn architecture() -> String {
	fn node(color: &str, name: &str, detail: &str) -> String {
		format!(
			"<div class=\"arch-node node-{}\"><div class=\"node-name\">{}</div><div class=\"small\">{}</div></div>\n",
			color, name, detail
		)
	}

	let mut html = String::from("<div class=\"layout-column wide\">\n");
	html.push_str(&heading("Technical Architecture", "blue"));
	html.push_str("<div class=\"arch\">\n<div class=\"arch-col\">\n");
	html.push_str(&node("blue", "Frontend", "Next.js 14, Tailwind, React"));
	html.push_str("<div class=\"arch-link vertical\"></div>\n");
	html.push_str(&node("purple", "Backend API", "Node.js / Secure Routes"));
	html.push_str("</div>\n<div class=\"arch-link\"></div>\n<div class=\"arch-col\">\n");
	html.push_str(&node("green", "Database", "PostgreSQL / Firestore"));
	html.push_str(&node("yellow", "Storage", "GCP / AWS S3"));
	html.push_str("</div>\n<div class=\"arch-link\"></div>\n<div class=\"arch-col\">\n");
	html.push_str(&node("gray", "Hosting", "Vercel"));
	html.push_str("</div>\n</div>\n</div>");
	html
}

fn timeline() -> String {
	const STEPS: [&str; 7] = [
		"UI &amp; Layout",
		"TTS Studio",
		"Voices/Clone",
		"API Section",
		"Admin Panel",
		"Localization",
		"Deployment",
	];

	let mut html = String::from("<div class=\"layout-column wide\">\n");
	html.push_str(&heading("Project Timeline (2-4 Weeks)", "cyan"));
	html.push_str("<div class=\"timeline\">\n<div class=\"timeline-rail\"></div>\n");
	for (i, step) in STEPS.iter().enumerate() {
		html.push_str(&format!(
			"<div class=\"milestone\"><span class=\"dot\"></span><div class=\"step\">{}</div><div class=\"muted small\">Week {}</div></div>\n",
			step,
			(i + 2) / 2
		));
	}
	html.push_str("</div>\n</div>");
	html
}

fn terms() -> String {
	const TERMS: [&str; 5] = [
		"Payment: 50% Upfront, 50% Upon Delivery.",
		"Revision: 2 Rounds of revisions included in the proposal scope.",
		"IP Rights: TalentlyX transfers all IP to Nabrah upon full payment.",
		"Maintenance: 1 Month free bug-fix support post-launch.",
		"Third-Party Costs: Server/API costs are borne by the client.",
	];

	let mut list = String::from("<ol class=\"terms\">\n");
	for term in TERMS {
		list.push_str(&format!("<li>{}</li>\n", term));
	}
	list.push_str("</ol>");

	let mut html = String::from("<div class=\"layout-column slim\">\n");
	html.push_str(&heading("Terms &amp; Conditions", "plain"));
	html.push_str(&card("", &list));
	html.push_str("</div>");
	html
}

fn next_steps() -> String {
	const STEPS: [(&str, &str); 4] = [
		("Approve Proposal", "Sign off on deliverables and timeline."),
		("Provide API Docs", "Share documentation for existing TTS integration."),
		("Begin Development", "Kickoff meeting and immediate sprint start."),
		("Weekly Updates", "Continuous feedback loop and progress tracking."),
	];

	let mut html = String::from("<div class=\"layout-column narrow\">\n");
	html.push_str(&heading("Next Steps", "plain"));
	html.push_str("<div class=\"stack\">\n");
	for (i, (name, desc)) in STEPS.iter().enumerate() {
		html.push_str(&format!(
			"<div class=\"step-row\"><span class=\"step-number\">{}</span><div><div class=\"step-title\">{}</div><div class=\"muted\">{}</div></div></div>\n",
			i + 1,
			name,
			desc
		));
	}
	html.push_str("</div>\n</div>");
	html
}

fn thank_you() -> String {
	let mut html = String::from("<div class=\"layout-center\">\n");
	html.push_str("<h2 class=\"hero gradient-text\">Thank You</h2>\n");
	html.push_str("<p class=\"hero-subtitle plain\">Looking forward to building with you.</p>\n");
	html.push_str(&card(
		"contact",
		"<div class=\"contact-team\">TalentlyX Team</div>\n\
		 <div class=\"accent-cyan\"><span class=\"muted\">Email:</span> zaid@talentlyx.com</div>\n\
		 <div class=\"accent-cyan\"><span class=\"muted\">Phone:</span> +966 55 353 2798</div>",
	));
	html.push_str("</div>");
	html
}
