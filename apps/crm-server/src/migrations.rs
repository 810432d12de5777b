use crm_db::sea_orm_migration::{MigrationTrait, MigratorTrait};

/// Every module's migrations, in dependency order.
pub struct Migrator;

impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        let mut all = policy_engine::Migrator::migrations();
        all.extend(identity::Migrator::migrations());
        all.extend(audit_trail::Migrator::migrations());
        all.extend(crate::orders::migration::Migrator::migrations());
        all
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn migration_names_are_unique_and_ordered() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_owned())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names, sorted);
    }
}
