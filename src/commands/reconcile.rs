use super::{CommandContext, CommandError, MaintenanceCommand, Report};
use crate::reconciliation::{inspect, repair, ReconcileTarget};
use async_trait::async_trait;

/// Read-only pass printing every flagged record and its findings.
#[derive(Debug, Clone, Default)]
pub struct InspectImages {
    pub target: ReconcileTarget,
    /// Inspect every record instead of only those with the flag set
    pub all: bool,
}

#[async_trait]
impl MaintenanceCommand for InspectImages {
    fn name(&self) -> &str {
        "inspect-images"
    }

    fn description(&self) -> &str {
        "List flagged records and warn about missing or malformed image URLs"
    }

    async fn run(&self, ctx: &CommandContext) -> Result<Report, CommandError> {
        self.target.validate().map_err(CommandError::InvalidArgument)?;
        let predicate = if self.all {
            Vec::new()
        } else {
            self.target.flagged()
        };
        let report = inspect(ctx.records.as_ref(), &self.target, predicate).await?;
        Ok(Report::Inspect(report))
    }
}

/// Clears the flag on records whose image list is null.
#[derive(Debug, Clone, Default)]
pub struct FixImages {
    pub target: ReconcileTarget,
    pub dry_run: bool,
}

#[async_trait]
impl MaintenanceCommand for FixImages {
    fn name(&self) -> &str {
        "fix-images"
    }

    fn description(&self) -> &str {
        "Set the flag to false on records that claim images but have none"
    }

    async fn run(&self, ctx: &CommandContext) -> Result<Report, CommandError> {
        self.target.validate().map_err(CommandError::InvalidArgument)?;
        let report = repair(ctx.records.as_ref(), &self.target, self.dry_run).await?;
        Ok(Report::Repair(report))
    }
}
