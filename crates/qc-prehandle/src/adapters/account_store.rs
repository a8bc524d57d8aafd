//! In-memory account snapshot.

use std::collections::HashMap;

use shared_types::{long_zero_num, Account, AccountId, ContractId, EvmAddress};

use crate::ports::outbound::AccountDirectory;

/// Immutable account snapshot, built once and shared by all workers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountStore {
    accounts: HashMap<u64, Account>,
    aliases: HashMap<Vec<u8>, u64>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account. Accounts without a numeric id are ignored.
    pub fn with_account(mut self, account: Account) -> Self {
        self.insert(account);
        self
    }

    pub fn insert(&mut self, account: Account) {
        let Some(num) = account.id.num() else {
            return;
        };
        if let Some(alias) = &account.alias {
            self.aliases.insert(alias.clone(), num);
        }
        self.accounts.insert(num, account);
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn resolve_alias(&self, alias: &[u8]) -> Option<u64> {
        if let Some(num) = self.aliases.get(alias) {
            return Some(*num);
        }
        EvmAddress::try_from(alias)
            .ok()
            .and_then(|address| long_zero_num(&address))
    }
}

impl AccountDirectory for InMemoryAccountStore {
    fn get_account_by_id(&self, id: &AccountId) -> Option<Account> {
        let num = match id {
            AccountId::Num(num) => *num,
            AccountId::Alias(alias) => self.resolve_alias(alias)?,
        };
        self.accounts.get(&num).cloned()
    }

    fn get_contract_by_id(&self, id: &ContractId) -> Option<Account> {
        let num = match id {
            ContractId::Num(num) => *num,
            ContractId::EvmAddress(address) => self.resolve_alias(address)?,
        };
        self.accounts
            .get(&num)
            .filter(|account| account.smart_contract)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Key;

    #[test]
    fn test_resolves_numbers_and_aliases() {
        let mut aliased = Account::new(1001, Key::Ed25519([1; 32]));
        aliased.alias = Some(vec![0xCC; 20]);
        let store = InMemoryAccountStore::new().with_account(aliased);

        let by_num = store.get_account_by_id(&AccountId::Num(1001)).expect("exists");
        let by_alias = store
            .get_account_by_id(&AccountId::Alias(vec![0xCC; 20]))
            .expect("exists");
        assert_eq!(by_num, by_alias);
        assert_eq!(by_alias.id, AccountId::Num(1001));

        let mut long_zero = vec![0u8; 20];
        long_zero[18..].copy_from_slice(&1001u16.to_be_bytes());
        assert!(store.get_account_by_id(&AccountId::Alias(long_zero)).is_some());

        assert!(store.get_account_by_id(&AccountId::Num(1002)).is_none());
    }

    #[test]
    fn test_contracts_only() {
        let mut contract = Account::new(2001, Key::Ed25519([2; 32]));
        contract.smart_contract = true;
        let store = InMemoryAccountStore::new()
            .with_account(contract)
            .with_account(Account::new(1001, Key::Ed25519([1; 32])));

        assert!(store.get_contract_by_id(&ContractId::Num(2001)).is_some());
        assert!(store.get_contract_by_id(&ContractId::Num(1001)).is_none());

        let mut address = [0u8; 20];
        address[18..].copy_from_slice(&2001u16.to_be_bytes());
        assert!(store.get_contract_by_id(&ContractId::EvmAddress(address)).is_some());
    }
}
