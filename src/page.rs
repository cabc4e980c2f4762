//! The profile page the demo scrolls through.

use vista_scene::{
    AnimatedCounterSet, Bound, CounterItem, Rect, RegionId, RevealSubscription, ScrollLayout,
    SkillBar, SkillBars, Stage, Typewriter,
};

/// Hero headline typed on load.
pub const HEADLINE: &str = "HR Professional | Talent Acquisition Specialist";

/// Page sections in document order, with their rendered heights.
pub const SECTIONS: [(&str, f32); 7] = [
    ("home", 800.0),
    ("experience", 1100.0),
    ("skills", 900.0),
    ("education", 700.0),
    ("achievements", 600.0),
    ("projects", 1000.0),
    ("contact", 700.0),
];

pub const SKILLS: [(&str, f64); 9] = [
    ("Talent Acquisition", 95.0),
    ("Campus Recruitment", 90.0),
    ("Screening & Interviewing", 85.0),
    ("HR Operations", 90.0),
    ("Compliance", 85.0),
    ("Employee Engagement", 80.0),
    ("Problem Solving", 90.0),
    ("Decision Making", 85.0),
    ("Data-Driven Recruitment", 80.0),
];

pub struct Achievement {
    pub id: &'static str,
    pub value: f64,
    pub suffix: &'static str,
    pub label: &'static str,
}

pub const ACHIEVEMENTS: [Achievement; 4] = [
    Achievement { id: "employees-onboarded", value: 100.0, suffix: "+", label: "Employees Onboarded" },
    Achievement { id: "retention-rate", value: 90.0, suffix: "%", label: "Retention Rate" },
    Achievement { id: "campus-partnerships", value: 50.0, suffix: "+", label: "Campus Partnerships" },
    Achievement { id: "mba-cohort", value: 5.0, suffix: "%", label: "Top MBA Cohort" },
];

/// Mounted page: layout plus every scroll-driven component.
pub struct ProfilePage {
    layout: ScrollLayout,
    sections: Vec<(&'static str, RegionId)>,
    pub reveals: Vec<(&'static str, RevealSubscription)>,
    pub counters: Bound<AnimatedCounterSet>,
    pub bars: Bound<SkillBars>,
    pub headline: Typewriter,
}

impl ProfilePage {
    pub fn mount(stage: &Stage, width: f32, height: f32) -> Self {
        let mut layout = ScrollLayout::new(width, height);
        let mut sections = Vec::with_capacity(SECTIONS.len());
        let mut y = 0.0;
        for (id, section_height) in SECTIONS {
            let region = layout.mount(Rect::new(0.0, y, width, section_height));
            sections.push((id, region));
            y += section_height;
        }

        let region_of = |name: &str| {
            sections
                .iter()
                .find(|(id, _)| *id == name)
                .map(|(_, region)| *region)
        };

        let threshold = stage.defaults().threshold;
        let reveals = sections
            .iter()
            .filter(|(id, _)| *id != "home")
            .map(|(id, region)| (*id, stage.reveal_with_defaults(Some(*region))))
            .collect();

        let counters = stage.animate_group_once_visible(
            region_of("achievements"),
            ACHIEVEMENTS
                .iter()
                .map(|a| CounterItem::new(a.id, a.value))
                .collect(),
            threshold,
            stage.defaults().counter_duration_ms,
        );

        let bars = stage.bars_once_visible(
            region_of("skills"),
            SKILLS
                .iter()
                .map(|(name, pct)| SkillBar::new(*name, *pct))
                .collect(),
            threshold,
        );

        let headline = stage.typewriter(HEADLINE);

        Self {
            layout,
            sections,
            reveals,
            counters,
            bars,
            headline,
        }
    }

    pub fn layout(&self) -> &ScrollLayout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut ScrollLayout {
        &mut self.layout
    }

    pub fn region(&self, name: &str) -> Option<RegionId> {
        self.sections
            .iter()
            .find(|(id, _)| *id == name)
            .map(|(_, region)| *region)
    }

    /// Counter readouts as rendered, e.g. `90%`.
    pub fn counter_labels(&self) -> Vec<String> {
        self.counters
            .snapshot()
            .display_values()
            .iter()
            .zip(ACHIEVEMENTS.iter())
            .map(|(value, a)| format!("{}{} {}", value, a.suffix, a.label))
            .collect()
    }

    /// Scrolled as far as the layout allows.
    pub fn at_bottom(&self) -> bool {
        let max_scroll = (self.layout.content_height() - self.layout.viewport_height()).max(0.0);
        self.layout.scroll_y() >= max_scroll
    }

    pub fn teardown(&self) {
        for (_, reveal) in &self.reveals {
            reveal.teardown();
        }
        self.counters.teardown();
        self.bars.teardown();
        self.headline.teardown();
    }
}
