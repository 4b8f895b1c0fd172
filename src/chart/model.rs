use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{DataStock, PointId, Series, TimeSlice};
use crate::surface::WindowSource;

/// Handle of a series owned by the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesId(u32);

impl SeriesId {
    /// The series shown by the built-in drawings.
    pub const MAIN: Self = Self(0);

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Series owned by a chart: the main series plus sub-chart series.
#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    series: IndexMap<SeriesId, Series>,
    next_id: u32,
}

impl SeriesStore {
    #[must_use]
    pub fn new(main: Series) -> Self {
        let mut series = IndexMap::new();
        series.insert(SeriesId::MAIN, main);
        Self { series, next_id: 1 }
    }

    #[must_use]
    pub fn main(&self) -> Option<&Series> {
        self.series.get(&SeriesId::MAIN)
    }

    #[must_use]
    pub fn get(&self, id: SeriesId) -> Option<&Series> {
        self.series.get(&id)
    }

    pub fn get_mut(&mut self, id: SeriesId) -> Option<&mut Series> {
        self.series.get_mut(&id)
    }

    pub fn add(&mut self, series: Series) -> SeriesId {
        let id = SeriesId(self.next_id);
        self.next_id += 1;
        self.series.insert(id, series);
        id
    }

    /// Replaces the main series and drops every sub-chart series.
    pub fn reset_main(&mut self, main: Series) {
        self.series.clear();
        self.series.insert(SeriesId::MAIN, main);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Sample of the main series behind `id`.
    #[must_use]
    pub fn main_point(&self, id: Option<PointId>) -> Option<&DataStock> {
        self.main()?.get(id?)
    }
}

/// Chart-level selection state shared by every surface.
///
/// Only the chart writes it: drawings report changes through
/// [`crate::drawing::EventOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewModel {
    /// Overall displayed range, the data span plus the future margin.
    pub master: TimeSlice,
    /// Zoomed window, always bounded inside `master`.
    pub selection: TimeSlice,
    /// Picked sample of the main series.
    pub selected_point: Option<PointId>,
    pub local_zone: bool,
}

impl ViewModel {
    #[must_use]
    pub fn window(&self, source: WindowSource) -> &TimeSlice {
        match source {
            WindowSource::Master => &self.master,
            WindowSource::Selection => &self.selection,
        }
    }
}
