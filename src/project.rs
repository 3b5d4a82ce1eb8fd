use std::sync::Arc;

use crate::language::JavaLanguage;
use crate::source::{AnalysisInputLocation, SourceType};
use crate::view::{JavaView, OptionsSpecifier};

/// Language plus the ordered input locations classes are resolved from.
/// Each location is tagged as application or library code.
#[derive(Debug)]
pub struct Project {
    language: JavaLanguage,
    locations: Vec<Arc<dyn AnalysisInputLocation>>,
    source_types: Vec<SourceType>,
}

impl Project {
    pub fn builder(language: JavaLanguage) -> ProjectBuilder {
        ProjectBuilder {
            language,
            locations: Vec::new(),
            source_types: Vec::new(),
        }
    }

    pub fn language(&self) -> &JavaLanguage {
        &self.language
    }

    /// Locations in registration order.
    pub fn locations(&self) -> &[Arc<dyn AnalysisInputLocation>] {
        &self.locations
    }

    /// Locations in registration order with the role of their classes.
    pub fn tagged_locations(
        &self,
    ) -> impl Iterator<Item = (&Arc<dyn AnalysisInputLocation>, SourceType)> + '_ {
        self.locations
            .iter()
            .zip(self.source_types.iter().copied())
    }

    pub fn create_view(self) -> JavaView {
        JavaView::new(self)
    }

    pub fn create_view_with_options(self, specifier: OptionsSpecifier) -> JavaView {
        JavaView::with_options_specifier(self, specifier)
    }
}

/// Collects locations in the order lookups consult them.
pub struct ProjectBuilder {
    language: JavaLanguage,
    locations: Vec<Arc<dyn AnalysisInputLocation>>,
    source_types: Vec<SourceType>,
}

impl ProjectBuilder {
    /// Adds a location holding application classes.
    pub fn add_input_location(self, location: Arc<dyn AnalysisInputLocation>) -> Self {
        self.add_location(location, SourceType::Application)
    }

    /// Adds a location holding library classes, such as a classpath entry.
    pub fn add_library_location(self, location: Arc<dyn AnalysisInputLocation>) -> Self {
        self.add_location(location, SourceType::Library)
    }

    pub fn add_location(
        mut self,
        location: Arc<dyn AnalysisInputLocation>,
        source_type: SourceType,
    ) -> Self {
        self.locations.push(location);
        self.source_types.push(source_type);
        self
    }

    pub fn build(self) -> Project {
        Project {
            language: self.language,
            locations: self.locations,
            source_types: self.source_types,
        }
    }
}
