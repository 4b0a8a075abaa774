use std::collections::BTreeSet;

use bastion_domain::AccountSpec;

use super::*;

impl AuthorizationService {
    /// Decides whether a user may perform an action with an account on an asset.
    ///
    /// A denial is `Ok` with `allowed == false`; store failures are errors.
    pub async fn check_access(
        &self,
        tenant_id: TenantId,
        request: &AccessRequest,
    ) -> AppResult<AccessDecision> {
        let now = self.clock.now();
        let denied = AccessDecision {
            allowed: false,
            actions: ActionSet::NONE,
            grant_ids: Vec::new(),
            evaluated_at: now,
        };
        if !self.user_exists(tenant_id, request.user_id).await? {
            return Ok(denied);
        }

        let group_ids = self.user_group_ids(tenant_id, request.user_id).await?;
        let mut candidates = self
            .grant_repository
            .list_grants_for_principals(tenant_id, request.user_id, &group_ids)
            .await?;
        candidates.retain(|grant| {
            grant.is_valid(now)
                && grant.accounts().admits(request.account_username.as_str())
        });

        let candidates = self
            .retain_grants_covering_asset(tenant_id, candidates, request.asset_id)
            .await?;
        if candidates.is_empty() {
            return Ok(denied);
        }

        let account_exists = !self
            .account_resolver
            .accounts_on_assets(
                tenant_id,
                &AccountSpec::ExplicitNames(BTreeSet::from([request.account_username.clone()])),
                BTreeSet::from([request.asset_id]),
            )
            .await?
            .is_empty();
        if !account_exists {
            return Ok(denied);
        }

        let actions = candidates
            .iter()
            .fold(ActionSet::NONE, |merged, grant| merged.union(grant.actions()));

        Ok(AccessDecision {
            allowed: actions.contains(request.action),
            actions,
            grant_ids: candidates.iter().map(PermissionGrant::id).collect(),
            evaluated_at: now,
        })
    }
}
