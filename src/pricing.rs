//! Matching announcements to post-announcement prices

use crate::constants::DEFAULT_PRICE_OFFSET_DAYS;
use crate::events::{PipelineEvent, PipelineObserver, SkipReason, Stage};
use crate::record::QuarterlyRecord;
use crate::types::PricePoint;
use chrono::{Duration, NaiveDate};
use hashbrown::HashSet;

/// Opening prices, one per date, ordered by date
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series; on duplicate dates the first point wins
    pub fn new<I: IntoIterator<Item = PricePoint>>(points: I) -> Self {
        let mut seen = HashSet::new();
        let mut points: Vec<PricePoint> = points
            .into_iter()
            .filter(|p| seen.insert(p.date))
            .collect();
        points.sort_by_key(|p| p.date);
        Self { points }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First and last observation dates
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.points.first()?.date, self.points.last()?.date))
    }
}

impl FromIterator<PricePoint> for PriceSeries {
    fn from_iter<I: IntoIterator<Item = PricePoint>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// How a price observation was matched
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceMatch {
    /// First observation on or after the day after the announcement
    NextSession(PricePoint),
    /// Observation on the announcement day itself
    SameDay(PricePoint),
}

impl PriceMatch {
    pub fn point(&self) -> PricePoint {
        match self {
            PriceMatch::NextSession(p) | PriceMatch::SameDay(p) => *p,
        }
    }

    pub fn is_same_day(&self) -> bool {
        matches!(self, PriceMatch::SameDay(_))
    }
}

/// Finds the price the market set after a disclosure
#[derive(Debug, Clone, Copy)]
pub struct PriceAligner {
    offset_days: i64,
}

impl Default for PriceAligner {
    fn default() -> Self {
        Self {
            offset_days: DEFAULT_PRICE_OFFSET_DAYS,
        }
    }
}

impl PriceAligner {
    pub fn new(offset_days: i64) -> Self {
        Self { offset_days }
    }

    /// Match one announcement date against points in any order.
    ///
    /// The closest point dated on or after `announcement + offset` wins, the
    /// earliest encountered on ties. Without one, a point dated exactly on the
    /// announcement is used.
    pub fn align(&self, announcement: NaiveDate, points: &[PricePoint]) -> Option<PriceMatch> {
        let target = announcement.checked_add_signed(Duration::days(self.offset_days))?;

        let mut best: Option<(i64, PricePoint)> = None;
        for point in points.iter().filter(|p| p.date >= target) {
            let diff = (point.date - target).num_days();
            if best.map_or(true, |(min, _)| diff < min) {
                best = Some((diff, *point));
            }
        }

        if let Some((_, point)) = best {
            return Some(PriceMatch::NextSession(point));
        }

        points
            .iter()
            .find(|p| p.date == announcement)
            .map(|p| PriceMatch::SameDay(*p))
    }

    /// Fill `price_date` and `price_open` for every record with a parsable period
    pub fn apply(
        &self,
        records: &mut [QuarterlyRecord],
        series: &PriceSeries,
        observer: &mut dyn PipelineObserver,
    ) {
        observer.on_event(&PipelineEvent::StageStarted {
            stage: Stage::PriceAlignment,
            records: records.len(),
        });

        for record in records.iter_mut() {
            record.price_date = None;
            record.price_open = None;

            if !record.is_well_formed() {
                observer.on_event(&PipelineEvent::PriceUnmatched {
                    period: record.period.clone(),
                    reason: SkipReason::MalformedPeriod,
                });
                continue;
            }

            let Some(announcement) = record.announcement_date else {
                observer.on_event(&PipelineEvent::PriceUnmatched {
                    period: record.period.clone(),
                    reason: SkipReason::MissingAnnouncementDate,
                });
                continue;
            };

            match self.align(announcement, series.points()) {
                Some(matched) => {
                    let point = matched.point();
                    record.price_date = Some(point.date);
                    record.price_open = Some(point.open);
                    observer.on_event(&PipelineEvent::PriceMatched {
                        period: record.period.clone(),
                        date: point.date,
                        open: point.open,
                        same_day: matched.is_same_day(),
                    });
                }
                None => observer.on_event(&PipelineEvent::PriceUnmatched {
                    period: record.period.clone(),
                    reason: SkipReason::NoPriceObservation,
                }),
            }
        }
    }
}
