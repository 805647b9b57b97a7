use sysinfo::System;

/// Informations sur un processus en cours d'exécution.
#[derive(Debug, Clone)]
pub struct ProcessInfo {
    pub pid: u32,
    pub process_name: String,
}

/// Cherche un processus dont le nom correspond exactement à `name`.
///
/// Retourne le premier processus trouvé, ou `None` si aucun ne correspond.
pub fn find_process_by_name(name: &str) -> Option<ProcessInfo> {
    let mut system = System::new();
    system.refresh_processes();

    let process = system.processes_by_exact_name(name).next()?;
    Some(ProcessInfo {
        pid: process.pid().as_u32(),
        process_name: process.name().to_string(),
    })
}

/// Returns true if a process named exactly `name` is running.
pub fn is_process_running(name: &str) -> bool {
    find_process_by_name(name).is_some()
}
