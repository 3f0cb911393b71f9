use rvstruct::ValueStruct;

#[derive(Debug, Clone, ValueStruct)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn is_blank(&self) -> bool {
        self.value().trim().is_empty()
    }
}

#[derive(Debug, Clone, ValueStruct)]
pub struct ModelName(String);

#[derive(Debug, Clone, ValueStruct)]
pub struct GcpProjectId(String);

/// Debit/credit pair entered by a student that the advisor is asked to critique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentJournalEntry {
    pub debit_account: String,
    pub credit_account: String,
}

impl StudentJournalEntry {
    pub fn new(debit_account: &str, credit_account: &str) -> Result<Self, String> {
        let debit_account = debit_account.trim();
        let credit_account = credit_account.trim();
        if debit_account.is_empty() || credit_account.is_empty() {
            return Err("Both debit and credit accounts are required for a journal entry".into());
        }
        Ok(Self {
            debit_account: debit_account.to_string(),
            credit_account: credit_account.to_string(),
        })
    }
}
