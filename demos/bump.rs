use std::io::Read;
use std::ptr;

use hallocator::{os_calloc, os_free, os_malloc, os_realloc};

/// Waits until the user presses ENTER. Useful for inspecting the process's
/// memory state with tools like `pmap`, `htop` or `gdb` between steps.
fn block_until_enter_pressed() {
    println!("\n>>> Press ENTER to continue...");
    let _ = std::io::stdin().bytes().next();
}

unsafe fn print_program_break(label: &str) {
    println!(
        "[{}] PID = {}, program break (sbrk(0)) = {:?}",
        label,
        std::process::id(),
        unsafe { libc::sbrk(0) },
    );
}

fn main() {
    unsafe {
        print_program_break("start");
        block_until_enter_pressed();

        // --------------------------------------------------------------
        // 1) First allocation ever: claims the whole prealloc slab.
        // --------------------------------------------------------------
        let first = os_malloc(100) as *mut u64;
        println!("\n[1] os_malloc(100) = {:?}", first);
        assert!(!first.is_null());
        first.write(0xDEADBEEF);
        println!("[1] Value written = 0x{:X}", first.read());
        block_until_enter_pressed();

        // --------------------------------------------------------------
        // 2) Second allocation: the slab is one ALLOC block, so this one
        //    falls through to a fresh sbrk of its own size.
        // --------------------------------------------------------------
        let second = os_malloc(12);
        println!("\n[2] os_malloc(12) = {:?}", second);
        ptr::write_bytes(second, 0xAB, 12);
        block_until_enter_pressed();

        // --------------------------------------------------------------
        // 3) Free the first block, then allocate something that fits: the
        //    next os_malloc reuses it via best-fit + split.
        // --------------------------------------------------------------
        os_free(first as *mut u8);
        println!("\n[3] Freed first block at {:?}", first);

        let reused = os_malloc(8);
        println!(
            "[3] os_malloc(8) = {:?} (reused first block? {})",
            reused,
            reused == first as *mut u8
        );
        block_until_enter_pressed();

        // --------------------------------------------------------------
        // 4) os_calloc zero-initializes its payload.
        // --------------------------------------------------------------
        let zeroed = os_calloc(8, 4) as *mut u32;
        println!(
            "\n[4] os_calloc(8, 4) = {:?}, first word = {}",
            zeroed,
            zeroed.read()
        );
        block_until_enter_pressed();

        // --------------------------------------------------------------
        // 5) A request past the mmap threshold gets its own mapping.
        // --------------------------------------------------------------
        print_program_break("before large alloc");
        let big = os_malloc(200 * 1024);
        println!("\n[5] os_malloc(200 KiB) = {:?} (served via mmap)", big);
        print_program_break("after large alloc");
        os_free(big);
        block_until_enter_pressed();

        // --------------------------------------------------------------
        // 6) os_realloc grows an allocation, preserving its contents.
        // --------------------------------------------------------------
        let small = os_malloc(8) as *mut u64;
        small.write(0x1122334455667788);
        let grown = os_realloc(small as *mut u8, 4096) as *mut u64;
        println!(
            "\n[6] Grown allocation preserved value = {}",
            grown.read() == 0x1122334455667788
        );

        println!("\n[7] End of demo. The process will exit and the OS reclaims everything.");
    }
}
