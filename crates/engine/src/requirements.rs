//! Position requirement view: a position's live requirement list.
//!
//! Knows nothing about sets. The merge engine writes through [`RequirementView::upsert`].

use competency_core::actor::ActingUser;
use competency_core::error::CoreError;
use competency_core::requirement::{
    self, PositionCompetencyRequirement, RequirementPatch, RequirementUpsert,
};
use competency_core::types::DbId;

use crate::context::EngineContext;

pub struct RequirementView {
    ctx: EngineContext,
}

impl RequirementView {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Requirements of a position.
    pub async fn list(
        &self,
        position_id: DbId,
    ) -> Result<Vec<PositionCompetencyRequirement>, CoreError> {
        self.ctx.require_position(position_id).await?;
        self.list_unchecked(position_id).await
    }

    /// Requirements of a position the caller already knows exists.
    pub(crate) async fn list_unchecked(
        &self,
        position_id: DbId,
    ) -> Result<Vec<PositionCompetencyRequirement>, CoreError> {
        self.ctx
            .call(
                "list_requirements",
                self.ctx.store().list_requirements(position_id),
            )
            .await
    }

    /// Patch level and/or mandatory flag of one requirement.
    pub async fn update(
        &self,
        position_id: DbId,
        requirement_id: DbId,
        patch: &RequirementPatch,
        user: ActingUser,
    ) -> Result<PositionCompetencyRequirement, CoreError> {
        requirement::validate_patch(patch, &self.ctx.config().level_scale)?;
        self.require_requirement(position_id, requirement_id).await?;

        let updated = self
            .ctx
            .call(
                "update_requirement",
                self.ctx
                    .store()
                    .update_requirement(requirement_id, patch, user.id()),
            )
            .await?
            .ok_or(CoreError::NotFound {
                entity: "PositionCompetencyRequirement",
                id: requirement_id,
            })?;
        tracing::info!(
            position_id,
            requirement_id,
            user_id = user.id(),
            "Position requirement updated"
        );
        Ok(updated)
    }

    /// Insert or overwrite the requirement for one competency.
    pub async fn upsert(
        &self,
        position_id: DbId,
        input: &RequirementUpsert,
        user: ActingUser,
    ) -> Result<PositionCompetencyRequirement, CoreError> {
        self.ctx.config().level_scale.validate(input.required_level)?;
        self.ctx
            .call(
                "upsert_requirement",
                self.ctx
                    .store()
                    .upsert_requirement(position_id, input, user.id()),
            )
            .await
    }

    /// Delete one requirement.
    pub async fn remove(
        &self,
        position_id: DbId,
        requirement_id: DbId,
        user: ActingUser,
    ) -> Result<(), CoreError> {
        self.require_requirement(position_id, requirement_id).await?;
        let deleted = self
            .ctx
            .call(
                "delete_requirement",
                self.ctx.store().delete_requirement(requirement_id),
            )
            .await?;
        if !deleted {
            return Err(CoreError::NotFound {
                entity: "PositionCompetencyRequirement",
                id: requirement_id,
            });
        }
        tracing::info!(
            position_id,
            requirement_id,
            user_id = user.id(),
            "Position requirement removed"
        );
        Ok(())
    }

    async fn require_requirement(
        &self,
        position_id: DbId,
        requirement_id: DbId,
    ) -> Result<PositionCompetencyRequirement, CoreError> {
        self.ctx.require_position(position_id).await?;
        self.ctx
            .call(
                "find_requirement",
                self.ctx.store().find_requirement(requirement_id),
            )
            .await?
            .filter(|r| r.position_id == position_id)
            .ok_or(CoreError::NotFound {
                entity: "PositionCompetencyRequirement",
                id: requirement_id,
            })
    }
}
