//! Greedy room allocation for a single course.

use std::collections::BTreeSet;

use types::{Classroom, RoomId, Schedule, SlotId};

/// Packs rooms biggest-first until the running capacity covers `needed`;
/// capacity ties break on room id. Returns `None` when even the whole pool
/// is too small. A course with no students packs no rooms.
pub fn pack_rooms<'a, I>(pool: I, needed: u32) -> Option<Vec<RoomId>>
where
    I: IntoIterator<Item = &'a Classroom>,
{
    let mut rooms: Vec<&Classroom> = pool.into_iter().collect();
    rooms.sort_by(|a, b| b.capacity.cmp(&a.capacity).then_with(|| a.id.cmp(&b.id)));

    let mut packed = Vec::new();
    let mut total = 0u32;
    for room in rooms {
        if total >= needed {
            break;
        }
        packed.push(room.id.clone());
        total += room.capacity;
    }
    if total >= needed {
        Some(packed)
    } else {
        None
    }
}

/// Rooms already claimed by exams sitting in `slot`.
pub fn occupied_rooms(schedule: &Schedule, slot: SlotId) -> BTreeSet<RoomId> {
    schedule
        .all_exams()
        .filter(|e| e.slot == slot)
        .flat_map(|e| e.rooms.iter().cloned())
        .collect()
}

/// Combined capacity behind a room list, resolved against live classrooms.
/// Ids without a classroom contribute nothing.
pub fn packed_capacity(rooms: &[RoomId], classrooms: &[Classroom]) -> u32 {
    rooms
        .iter()
        .filter_map(|id| classrooms.iter().find(|c| &c.id == id))
        .map(|c| c.capacity)
        .sum()
}
