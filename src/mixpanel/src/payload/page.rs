use crate::event::PageView;
use crate::event::Surface;
use crate::event::Track;
use crate::settings::Settings;

/// Expands a page or screen view into the track calls the settings ask
/// for. Consolidated mode and the legacy track-all mode each emit one
/// call and stop; otherwise the categorized and named policies are
/// checked independently, so zero, one or two calls come out.
pub fn track_events(view: &PageView, surface: Surface, settings: &Settings) -> Vec<Track> {
    if settings.consolidated_page_calls {
        return vec![view.to_track(surface.generic_event().to_string())];
    }
    if settings.track_all_pages {
        return vec![view.to_track(view.default_event(surface))];
    }

    let mut out = Vec::new();
    if settings.track_categorized_pages {
        if let Some(category) = view.category() {
            let event = match view.name() {
                Some(name) => format!("{category} {name}"),
                None => category.to_string(),
            };
            out.push(view.to_track(event));
        }
    }
    if settings.track_named_pages {
        if let Some(name) = view.name() {
            out.push(view.to_track(name.to_string()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(category: &str, name: &str) -> PageView {
        PageView {
            category: Some(category.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn names(tracks: &[Track]) -> Vec<&str> {
        tracks.iter().map(|t| t.event.as_str()).collect()
    }

    #[test]
    fn categorized_only_emits_one_call() {
        let mut settings = Settings::with_token("tok");
        settings.track_categorized_pages = true;
        settings.track_named_pages = false;

        let tracks = track_events(&view("Docs", ""), Surface::Page, &settings);
        assert_eq!(names(&tracks), vec!["Docs"]);
    }

    #[test]
    fn both_policies_emit_two_calls() {
        let settings = Settings::with_token("tok");
        let tracks = track_events(&view("Docs", "Tutorial"), Surface::Page, &settings);
        assert_eq!(names(&tracks), vec!["Docs Tutorial", "Tutorial"]);
    }

    #[test]
    fn no_match_emits_nothing() {
        let settings = Settings::with_token("tok");
        let tracks = track_events(&view("", ""), Surface::Page, &settings);
        assert!(tracks.is_empty());
    }

    #[test]
    fn consolidated_mode_wins_over_everything() {
        let mut settings = Settings::with_token("tok");
        settings.consolidated_page_calls = true;
        settings.track_all_pages = true;

        let tracks = track_events(&view("Docs", "Tutorial"), Surface::Screen, &settings);
        assert_eq!(names(&tracks), vec!["Loaded a Screen"]);
    }

    #[test]
    fn track_all_pages_uses_the_default_event_name() {
        let mut settings = Settings::with_token("tok");
        settings.track_all_pages = true;

        let tracks = track_events(&view("Docs", "Tutorial"), Surface::Page, &settings);
        assert_eq!(names(&tracks), vec!["Viewed Docs Tutorial Page"]);

        let tracks = track_events(&view("", ""), Surface::Page, &settings);
        assert_eq!(names(&tracks), vec!["Loaded a Page"]);
    }

    #[test]
    fn emitted_tracks_carry_name_and_category_properties() {
        let settings = Settings::with_token("tok");
        let tracks = track_events(&view("Docs", "Tutorial"), Surface::Page, &settings);
        assert_eq!(tracks[0].properties["category"].as_str(), Some("Docs"));
        assert_eq!(tracks[0].properties["name"].as_str(), Some("Tutorial"));
    }
}
