use crate::config::SpriteWrap;
use crate::constants::{GLYPH_SIZE, INDEX_LIMIT, STACK_DEPTH};
use crate::error::{Chip8Error, Result};
use crate::opcode::Opcode;
use crate::state::State;

/// What executing one operation does to the machine
#[allow(clippy::large_enum_variant)]
pub enum Transition {
    /// The instruction completed; this is the new state
    Next(State),
    /// The instruction can't complete yet and should be retried (FX0A with no key down)
    Blocked,
}

/// Signature shared by every operation
pub type Operation = fn(op: &dyn Opcode, state: &State, wrap: SpriteWrap) -> Result<Transition>;

fn next(state: State) -> Result<Transition> {
    Ok(Transition::Next(state))
}

/// pc += 4 when `condition` holds, otherwise pc += 2
fn skip_if(state: &State, condition: bool) -> Result<Transition> {
    let pc = if condition {
        state.pc + 0x4
    } else {
        state.pc + 0x2
    };
    next(State { pc, ..*state })
}

/// Vx = result; VF = flag
/// The flag is written last so it survives when x is VF.
fn alu(op: &dyn Opcode, state: &State, result: u8, flag: u8) -> Result<Transition> {
    let mut v = state.v;
    v[op.x()] = result;
    v[0xF] = flag;
    next(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// clear
pub fn clr(_op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let mut frame_buffer = state.frame_buffer;
    frame_buffer.clear();
    next(State {
        pc: state.pc + 0x2,
        frame_buffer,
        draw_flag: true,
        ..*state
    })
}

/// PC = STACK.pop() + 2
pub fn rts(_op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    if state.sp == 0 {
        return Err(Chip8Error::StackUnderflow { pc: state.pc });
    }
    let sp = state.sp - 1;
    next(State {
        pc: state.stack[sp] + 0x2,
        sp,
        ..*state
    })
}

/// PC = nnn
pub fn jump(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    next(State {
        pc: op.nnn(),
        ..*state
    })
}

/// STACK.push(PC); PC = nnn
pub fn call(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    if state.sp == STACK_DEPTH {
        return Err(Chip8Error::StackOverflow { pc: state.pc });
    }
    let mut stack = state.stack;
    stack[state.sp] = state.pc;
    next(State {
        pc: op.nnn(),
        sp: state.sp + 1,
        stack,
        ..*state
    })
}

/// if Vx == nn then skip
pub fn ske(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    skip_if(state, state.v[op.x()] == op.nn())
}

/// if Vx != nn then skip
pub fn skne(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    skip_if(state, state.v[op.x()] != op.nn())
}

/// if Vx == Vy then skip
pub fn skre(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    skip_if(state, state.v[op.x()] == state.v[op.y()])
}

/// if Vx != Vy then skip
pub fn skrne(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    skip_if(state, state.v[op.x()] != state.v[op.y()])
}

/// Vx = nn
pub fn load(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let mut v = state.v;
    v[op.x()] = op.nn();
    next(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// Vx += nn
/// Wraps around without touching VF
pub fn add(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let mut v = state.v;
    v[op.x()] = v[op.x()].wrapping_add(op.nn());
    next(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// Vx = Vy
pub fn mv(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let mut v = state.v;
    v[op.x()] = v[op.y()];
    next(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// Vx |= Vy
pub fn or(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let mut v = state.v;
    v[op.x()] |= v[op.y()];
    next(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// Vx &= Vy
pub fn and(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let mut v = state.v;
    v[op.x()] &= v[op.y()];
    next(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// Vx ^= Vy
pub fn xor(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let mut v = state.v;
    v[op.x()] ^= v[op.y()];
    next(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// Vx += Vy; VF = carry
/// The carry comes from the operands, before the sum is stored
pub fn addr(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let (vx, vy) = (state.v[op.x()], state.v[op.y()]);
    let carry = vy > 0xFF - vx;
    alu(op, state, vx.wrapping_add(vy), carry as u8)
}

/// Vx -= Vy; VF = !borrow
pub fn sub(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let (vx, vy) = (state.v[op.x()], state.v[op.y()]);
    let borrow = vy > vx;
    alu(op, state, vx.wrapping_sub(vy), !borrow as u8)
}

/// Vx >>= 1; VF = the bit shifted out
pub fn shr(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let vx = state.v[op.x()];
    alu(op, state, vx >> 1, vx & 0x1)
}

/// Vx = Vy - Vx; VF = !borrow
pub fn subn(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let (vx, vy) = (state.v[op.x()], state.v[op.y()]);
    let borrow = vx > vy;
    alu(op, state, vy.wrapping_sub(vx), !borrow as u8)
}

/// Vx <<= 1; VF = the bit shifted out
pub fn shl(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let vx = state.v[op.x()];
    alu(op, state, vx << 1, vx >> 7)
}

/// I = nnn
pub fn loadi(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    next(State {
        pc: state.pc + 0x2,
        i: op.nnn(),
        ..*state
    })
}

/// PC = V0 + nnn
pub fn jumpi(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    next(State {
        pc: u16::from(state.v[0x0]) + op.nnn(),
        ..*state
    })
}

/// Vx = rand_byte & nn
pub fn rand(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let rand_byte: u8 = rand::random();
    let mut v = state.v;
    v[op.x()] = rand_byte & op.nn();
    next(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs the sprite at memory[i..i+n] onto the FrameBuffer at (Vx, Vy).
/// Sets VF if any lit pixel is erased.
pub fn draw(op: &dyn Opcode, state: &State, wrap: SpriteWrap) -> Result<Transition> {
    let x = state.v[op.x()] as usize;
    let y = state.v[op.y()] as usize;
    let sprite = state.read(state.i as usize, op.n() as usize)?;

    let mut frame_buffer = state.frame_buffer;
    let mut collision = false;
    for (row, bits) in sprite.iter().enumerate() {
        for col in 0..8 {
            if *bits & (0x80u8 >> col) != 0 {
                collision |= frame_buffer.toggle(wrap.index(x + col, y + row));
            }
        }
    }

    let mut v = state.v;
    v[0xF] = collision as u8;
    next(State {
        pc: state.pc + 0x2,
        v,
        frame_buffer,
        draw_flag: true,
        ..*state
    })
}

/// if key Vx is pressed then skip
pub fn skpr(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    skip_if(state, state.is_pressed(state.v[op.x()]))
}

/// if key Vx isn't pressed then skip
pub fn skup(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    skip_if(state, !state.is_pressed(state.v[op.x()]))
}

/// Vx = DT
pub fn moved(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let mut v = state.v;
    v[op.x()] = state.delay_timer;
    next(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// Vx = await keypress
/// Stays on this instruction until a key is down
pub fn keyd(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let key = match state.pressed_key() {
        Some(key) => key,
        None => return Ok(Transition::Blocked),
    };
    let mut v = state.v;
    v[op.x()] = key;
    next(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// DT = Vx
pub fn loads(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    next(State {
        pc: state.pc + 0x2,
        delay_timer: state.v[op.x()],
        ..*state
    })
}

/// ST = Vx
pub fn ld(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    next(State {
        pc: state.pc + 0x2,
        sound_timer: state.v[op.x()],
        ..*state
    })
}

/// I += Vx; VF = I > 0xFFF
pub fn addi(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let i = state.i.wrapping_add(u16::from(state.v[op.x()]));
    let overflow = u32::from(state.i) + u32::from(state.v[op.x()]) > u32::from(INDEX_LIMIT);
    let mut v = state.v;
    v[0xF] = overflow as u8;
    next(State {
        pc: state.pc + 0x2,
        i,
        v,
        ..*state
    })
}

/// I = Vx * 5
/// Points I at the sprite sheet glyph for Vx
pub fn ldspr(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    next(State {
        pc: state.pc + 0x2,
        i: u16::from(state.v[op.x()]) * GLYPH_SIZE,
        ..*state
    })
}

/// mem[I..I+3] = bcd(Vx)
pub fn bcd(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let vx = state.v[op.x()];
    let mut next_state = *state;
    next_state
        .write(state.i as usize, 3)?
        .copy_from_slice(&[vx / 100, vx / 10 % 10, vx % 10]);
    next_state.pc += 0x2;
    next(next_state)
}

/// mem[I..=I+x] = V0..=Vx; I += x + 1
pub fn stor(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let count = op.x() + 1;
    let mut next_state = *state;
    next_state
        .write(state.i as usize, count)?
        .copy_from_slice(&state.v[..count]);
    next_state.i = state.i.wrapping_add(count as u16);
    next_state.pc += 0x2;
    next(next_state)
}

/// V0..=Vx = mem[I..=I+x]; I += x + 1
pub fn read(op: &dyn Opcode, state: &State, _wrap: SpriteWrap) -> Result<Transition> {
    let count = op.x() + 1;
    let mut v = state.v;
    v[..count].copy_from_slice(state.read(state.i as usize, count)?);
    next(State {
        pc: state.pc + 0x2,
        i: state.i.wrapping_add(count as u16),
        v,
        ..*state
    })
}
