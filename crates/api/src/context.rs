use stockroom_core::{Principal, Role, UserId};

/// Caller identity for a request, as asserted by the upstream auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(id: UserId, role: Role) -> Self {
        Self {
            principal: Principal::new(id, role),
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn id(&self) -> UserId {
        self.principal.id
    }

    pub fn role(&self) -> &Role {
        &self.principal.role
    }
}
