pub mod emission_estimator;
pub mod pipeline;
pub mod spatial_aggregator;

pub use emission_estimator::EmissionEstimator;
pub use pipeline::{AggregationReport, ClassBreakdown, EmissionPipeline, PipelineOutput};
pub use spatial_aggregator::{Aggregation, PointLayer, SkipReason, SkippedRecord, SpatialAggregator};
