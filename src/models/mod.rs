pub mod beneficiary;
pub mod entity;
pub mod records;

pub use beneficiary::{
    BeneficiaryMatch, BeneficiaryProfile, DistrictStats, EligibilityStatus, IncomeBracket,
};
pub use entity::{Entity, EntityId, NewEntity, OrgType};
pub use records::{FacilityRecord, FunderRecord, NgoRecord};
