//! # Pool de Slots de Tarea
//! src/memory/task.rs
//!
//! Conjunto fijo de sub-arenas, cada una reclamable por a lo sumo una
//! petición en vuelo. Reclamar un slot es un compare-and-swap sobre su flag
//! `in_use`, así que varios threads pueden llamar a [`TaskPool::acquire`] a
//! la vez sin asignar el mismo slot dos veces.
//!
//! El slot se devuelve al pool cuando se destruye el [`SlotLease`]: el scope
//! se cierra y el flag se limpia en cualquier camino de salida, incluido un
//! panic dentro del pipeline.

use super::arena::{Arena, Scope};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use tracing::{debug, error};

/// Tamaño mínimo de trabajo de cada sub-arena (64 KiB)
pub const MIN_SLOT_BYTES: usize = 64 * 1024;

/// Un slot: sub-arena + flag de uso
struct TaskSlot {
    in_use: AtomicBool,
    /// Solo el dueño del lease la bloquea, así que el lock nunca compite
    arena: Mutex<Arena<'static>>,
}

/// Pool fijo de slots, creado una vez al inicio
pub struct TaskPool {
    slots: Box<[TaskSlot]>,
}

impl TaskPool {
    /// Crea el pool a partir de sub-arenas ya repartidas
    pub fn new(arenas: Vec<Arena<'static>>) -> Self {
        let slots = arenas
            .into_iter()
            .map(|arena| TaskSlot {
                in_use: AtomicBool::new(false),
                arena: Mutex::new(arena),
            })
            .collect();

        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Número de slots reclamados en este momento
    pub fn in_use(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.in_use.load(Ordering::Acquire))
            .count()
    }

    /// Bytes usados por la arena de un slot (para diagnóstico y pruebas)
    pub fn slot_used(&self, index: usize) -> usize {
        lock_arena(&self.slots[index].arena).used()
    }

    /// Busca linealmente un slot libre, lo reclama y abre su scope.
    ///
    /// Retorna `None` si todos los slots están ocupados.
    pub fn acquire(self: &Arc<Self>) -> Option<SlotLease> {
        for (index, slot) in self.slots.iter().enumerate() {
            let claimed = slot
                .in_use
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok();

            if claimed {
                let scope = lock_arena(&slot.arena).open_scope();
                return Some(SlotLease {
                    pool: Arc::clone(self),
                    index,
                    scope: Some(scope),
                });
            }
        }

        None
    }

    /// Reintenta [`acquire`](Self::acquire) hasta conseguir un slot.
    ///
    /// Ocurre antes de que exista una respuesta, así que el cliente no ve
    /// nada; solo espera en la cola de `accept`.
    pub fn acquire_blocking(self: &Arc<Self>) -> SlotLease {
        let mut attempts: u64 = 0;
        loop {
            if let Some(lease) = self.acquire() {
                if attempts > 0 {
                    debug!(attempts, slot = lease.index(), "task slot acquired after waiting");
                }
                return lease;
            }

            attempts += 1;
            if attempts % 64 == 0 {
                thread::yield_now();
            } else {
                std::hint::spin_loop();
            }
        }
    }

    fn release(&self, index: usize, scope: Scope) {
        let slot = &self.slots[index];

        if let Err(e) = lock_arena(&slot.arena).close_scope(scope) {
            error!(slot = index, error = %e, "task scope could not be closed");
        }
        slot.in_use.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for TaskPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPool")
            .field("slots", &self.len())
            .field("in_use", &self.in_use())
            .finish()
    }
}

/// Un lock envenenado solo indica que otra petición hizo panic; la arena
/// sigue siendo consistente porque el scope se cierra en `Drop`.
fn lock_arena<'s>(arena: &'s Mutex<Arena<'static>>) -> MutexGuard<'s, Arena<'static>> {
    arena.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Slot reclamado por una petición
///
/// Es `Send`: se crea en el thread que acepta y viaja al worker.
#[derive(Debug)]
pub struct SlotLease {
    pool: Arc<TaskPool>,
    index: usize,
    scope: Option<Scope>,
}

impl SlotLease {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Acceso exclusivo a la arena del slot
    pub fn arena(&self) -> MutexGuard<'_, Arena<'static>> {
        lock_arena(&self.pool.slots[self.index].arena)
    }
}

impl Drop for SlotLease {
    fn drop(&mut self) {
        if let Some(scope) = self.scope.take() {
            self.pool.release(self.index, scope);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Helper: pool con su propia memoria, `count` slots de 4 KiB
    fn pool(count: usize) -> Arc<TaskPool> {
        let arena = Arena::with_process_lifetime(count * 4096);
        Arc::new(TaskPool::new(arena.split_evenly(count, 4096).unwrap()))
    }

    #[test]
    fn test_acquire_claims_distinct_slots() {
        let pool = pool(3);

        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        let c = pool.acquire().unwrap();

        assert_ne!(a.index(), b.index());
        assert_ne!(b.index(), c.index());
        assert_ne!(a.index(), c.index());
        assert_eq!(pool.in_use(), 3);
    }

    #[test]
    fn test_acquire_when_exhausted() {
        let pool = pool(1);

        let lease = pool.acquire().unwrap();
        assert!(pool.acquire().is_none());

        drop(lease);
        assert!(pool.acquire().is_some());
    }

    #[test]
    fn test_release_rolls_back_scope() {
        let pool = pool(1);
        let before = pool.slot_used(0);

        let lease = pool.acquire().unwrap();
        {
            let mut arena = lease.arena();
            arena.allocate(1000, 1).unwrap();
            let inner = arena.open_scope();
            arena.allocate(500, 8).unwrap();
            arena.close_scope(inner).unwrap();
        }
        drop(lease);

        assert_eq!(pool.slot_used(0), before);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn test_release_after_panic() {
        let pool = pool(1);
        let lease = pool.acquire().unwrap();

        let result = thread::spawn(move || {
            let mut arena = lease.arena();
            arena.allocate(100, 1).unwrap();
            panic!("pipeline failure");
        })
        .join();

        assert!(result.is_err());
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.slot_used(0), 0);
    }

    #[test]
    fn test_concurrent_acquire_is_exclusive() {
        let pool = pool(4);
        let holders: Arc<Vec<AtomicUsize>> = Arc::new((0..4).map(|_| AtomicUsize::new(0)).collect());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let holders = Arc::clone(&holders);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let lease = pool.acquire_blocking();
                        let previous = holders[lease.index()].fetch_add(1, Ordering::SeqCst);
                        assert_eq!(previous, 0, "slot {} held twice", lease.index());
                        lease.arena().allocate(64, 1).unwrap();
                        holders[lease.index()].fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(pool.in_use(), 0);
        for index in 0..pool.len() {
            assert_eq!(pool.slot_used(index), 0);
        }
    }
}
