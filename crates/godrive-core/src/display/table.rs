use crate::api::models::{
    InstructorProfile, InstructorSummary, PricingTier, Review, StudentProfile, User,
};
use crate::display::format::{
    cheapest_tier, format_categories, format_date, format_distance, format_price, format_rating,
};
use crate::utils::text::{truncate_text, wrap_text};
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets};
use crossterm::terminal;

struct ColumnWidths {
    name: usize,
    city: usize,
    comment: usize,
}

pub struct TableDisplay {
    max_width: Option<usize>,
    use_colors: bool,
}

impl Default for TableDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl TableDisplay {
    pub fn new() -> Self {
        Self {
            max_width: Self::detect_terminal_width(),
            use_colors: true,
        }
    }

    fn detect_terminal_width() -> Option<usize> {
        match terminal::size() {
            Ok((cols, _)) => Some((cols as usize).clamp(40, 200)),
            Err(_) => Some(80),
        }
    }

    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn bold_header(&self, text: &str, color: Color) -> Cell {
        if self.use_colors {
            Cell::new(text).add_attribute(Attribute::Bold).fg(color)
        } else {
            Cell::new(text).add_attribute(Attribute::Bold)
        }
    }

    fn colored_cell(&self, text: &str, color: Color) -> Cell {
        if self.use_colors {
            Cell::new(text).fg(color)
        } else {
            Cell::new(text)
        }
    }

    fn new_table(&self, headers: &[&str], color: Color) -> Table {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        self.configure_table_width(&mut table);
        let cells: Vec<Cell> = headers.iter().map(|h| self.bold_header(h, color)).collect();
        table.set_header(cells);
        table
    }

    fn configure_table_width(&self, table: &mut Table) {
        let width = self
            .max_width
            .map(|w| if w > 20 { w - 6 } else { w.max(40) })
            .unwrap_or(80);
        table.set_width(width as u16);
    }

    fn column_widths(&self) -> ColumnWidths {
        match self.max_width.unwrap_or(80) {
            0..=59 => ColumnWidths {
                name: 14,
                city: 8,
                comment: 20,
            },
            60..=99 => ColumnWidths {
                name: 22,
                city: 14,
                comment: 36,
            },
            _ => ColumnWidths {
                name: 32,
                city: 20,
                comment: 60,
            },
        }
    }

    /// Search results, one row per instructor.
    pub fn render_instructor_list(&self, instructors: &[InstructorSummary]) -> String {
        if instructors.is_empty() {
            return "No instructors found.".to_string();
        }

        let mut table = self.new_table(
            &["ID", "Name", "Categories", "Rating", "Price/lesson", "Distance", "City"],
            Color::Cyan,
        );
        let widths = self.column_widths();

        for instructor in instructors {
            table.add_row(vec![
                self.colored_cell(&instructor.id, Color::Cyan),
                Cell::new(truncate_text(&instructor.name, widths.name)),
                Cell::new(format_categories(&instructor.categories)),
                self.colored_cell(
                    &format_rating(instructor.rating, instructor.review_count),
                    Color::Yellow,
                ),
                self.colored_cell(&format_price(instructor.price_per_lesson), Color::Green),
                Cell::new(format_distance(instructor.distance_km)),
                Cell::new(truncate_text(
                    instructor.city.as_deref().unwrap_or("N/A"),
                    widths.city,
                )),
            ]);
        }

        table.to_string()
    }

    /// Instructor detail page: facts, then pricing and latest reviews.
    pub fn render_instructor_profile(&self, profile: &InstructorProfile) -> String {
        let mut table = self.new_table(&["Field", "Value"], Color::Green);
        let bio_width = self.column_widths().comment;

        let verified = if profile.verified { "Yes" } else { "No" };
        let experience = profile
            .years_of_experience
            .map(|years| format!("{} years", years))
            .unwrap_or_else(|| "N/A".to_string());
        let vehicle = profile
            .vehicle
            .as_ref()
            .map(|vehicle| {
                let mut label = vehicle.model.clone();
                if let Some(year) = vehicle.year {
                    label.push_str(&format!(" ({})", year));
                }
                if let Some(transmission) = &vehicle.transmission {
                    label.push_str(&format!(", {}", transmission));
                }
                label
            })
            .unwrap_or_else(|| "N/A".to_string());
        let starting_at = cheapest_tier(&profile.pricing)
            .map(|tier| format_price(tier.price / f64::from(tier.lessons.max(1))))
            .unwrap_or_else(|| "N/A".to_string());

        let rows = [
            ("ID", profile.id.clone()),
            ("Name", profile.name.clone()),
            ("City", profile.city.clone().unwrap_or_else(|| "N/A".to_string())),
            ("Categories", format_categories(&profile.categories)),
            ("Rating", format_rating(profile.rating, profile.review_count)),
            ("Experience", experience),
            ("Verified", verified.to_string()),
            ("Vehicle", vehicle),
            ("From (per lesson)", starting_at),
        ];
        for (field, value) in rows {
            table.add_row(vec![self.colored_cell(field, Color::Cyan), Cell::new(value)]);
        }
        if let Some(bio) = profile.bio.as_deref().filter(|bio| !bio.trim().is_empty()) {
            table.add_row(vec![
                self.colored_cell("Bio", Color::Cyan),
                Cell::new(wrap_text(bio, bio_width).join("\n")),
            ]);
        }

        let mut output = table.to_string();
        if !profile.pricing.is_empty() {
            output.push_str("\n\nPricing\n");
            output.push_str(&self.render_pricing(&profile.pricing));
        }
        if !profile.reviews.is_empty() {
            output.push_str("\n\nLatest reviews\n");
            output.push_str(&self.render_reviews(&profile.reviews));
        }
        output
    }

    /// Lesson packages; the best value per lesson is flagged.
    pub fn render_pricing(&self, tiers: &[PricingTier]) -> String {
        if tiers.is_empty() {
            return "No pricing published.".to_string();
        }

        let best = cheapest_tier(tiers).map(|tier| tier.id.as_str());
        let mut table = self.new_table(&["Package", "Lessons", "Price", "Per lesson", ""], Color::Cyan);

        for tier in tiers {
            let per_lesson = tier.price / f64::from(tier.lessons.max(1));
            let marker = if best == Some(tier.id.as_str()) && tiers.len() > 1 {
                "best value"
            } else {
                ""
            };
            table.add_row(vec![
                Cell::new(&tier.name),
                Cell::new(tier.lessons),
                self.colored_cell(&format_price(tier.price), Color::Green),
                Cell::new(format_price(per_lesson)),
                self.colored_cell(marker, Color::Yellow),
            ]);
        }

        table.to_string()
    }

    pub fn render_reviews(&self, reviews: &[Review]) -> String {
        if reviews.is_empty() {
            return "No reviews yet.".to_string();
        }

        let mut table = self.new_table(&["Date", "Student", "Rating", "Comment"], Color::Cyan);
        let widths = self.column_widths();

        for review in reviews {
            let stars = "★".repeat(usize::from(review.rating.min(5)));
            table.add_row(vec![
                Cell::new(format_date(&review.created_at)),
                Cell::new(truncate_text(&review.student_name, widths.name)),
                self.colored_cell(&stars, Color::Yellow),
                self.colored_cell(
                    &truncate_text(review.comment.as_deref().unwrap_or(""), widths.comment),
                    Color::DarkGrey,
                ),
            ]);
        }

        table.to_string()
    }

    pub fn render_student_profile(&self, profile: &StudentProfile) -> String {
        let mut table = self.new_table(&["Field", "Value"], Color::Green);
        let or_na = |value: Option<&str>| value.unwrap_or("N/A").to_string();

        let location = profile
            .location
            .map(|l| format!("{:.5}, {:.5}", l.latitude, l.longitude))
            .unwrap_or_else(|| "N/A".to_string());
        let rows = [
            ("Name", profile.name.clone()),
            ("Email", profile.email.clone()),
            ("Phone", or_na(profile.phone.as_deref())),
            (
                "License category",
                profile
                    .license_category
                    .map(|c| format!("{} ({})", c, c.description()))
                    .unwrap_or_else(|| "N/A".to_string()),
            ),
            ("Address", or_na(profile.address.as_deref())),
            ("Location", location),
            (
                "Member since",
                profile
                    .created_at
                    .as_ref()
                    .map(format_date)
                    .unwrap_or_else(|| "N/A".to_string()),
            ),
        ];
        for (field, value) in rows {
            table.add_row(vec![self.colored_cell(field, Color::Cyan), Cell::new(value)]);
        }

        table.to_string()
    }

    pub fn render_user(&self, user: &User) -> String {
        let mut table = self.new_table(&["Field", "Value"], Color::Green);
        let role = format!("{:?}", user.role).to_lowercase();
        for (field, value) in [
            ("ID", user.id.as_str()),
            ("Name", user.name.as_str()),
            ("Email", user.email.as_str()),
            ("Role", role.as_str()),
        ] {
            table.add_row(vec![self.colored_cell(field, Color::Cyan), Cell::new(value)]);
        }
        table.to_string()
    }
}
