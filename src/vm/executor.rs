//! Interpreter
//!
//! Executes a generated [`Module`] directly from its structured
//! instruction lists. Each task keeps its own frame stack, so a task that
//! calls `promise_await` on a pending promise simply stops; the scheduler
//! resumes it with the settled value later.

use super::errors::{VmError, VmResult};
use super::frames::{Frame, Jumps, Label, LabelKind, Task, TaskId};
use super::host::{Host, IoOutcome, IoRequest};
use super::memory::LinearMemory;
use super::scheduler::{Completion, Scheduler};
use super::value::Value;
use crate::middle::codegen::layout::{PAYLOAD_OFFSET, TAG_ERR, TAG_OK, WORD};
use crate::middle::codegen::{Instr, MemKind, Module, NumOp};
use crate::runtime::bridge::{HostImport, HOST_IMPORTS};
use crate::runtime::promise::{PromiseHandle, PromiseRegistry, PromiseState};
use crate::util::config::RuntimeConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// VM status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmStatus {
    Ready,
    Running,
    Finished,
    Failed,
}

/// Outcome of running a module
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// What `main` produced, after awaiting it if it is async
    pub value: Option<Value>,
    /// Lines written with `print`, when output is captured
    pub output: Vec<String>,
}

/// How a run slice of a task ended
enum Slice {
    Finished(Option<Value>),
    Blocked,
    Yielded,
}

enum HostCall {
    Return(Option<Value>),
    Suspend(PromiseHandle),
}

/// Virtual machine for one module instance
pub struct Vm {
    module: Arc<Module>,
    jumps: Arc<Vec<Jumps>>,
    config: RuntimeConfig,
    status: VmStatus,
    memory: LinearMemory,
    host: Host,
    promises: PromiseRegistry<TaskId>,
    scheduler: Scheduler,
    tasks: HashMap<TaskId, Task>,
    next_task: u32,
    root: Option<TaskId>,
    root_result: Option<Option<Value>>,
}

impl Vm {
    /// Instantiate `module` with the default configuration
    pub fn new(module: Module) -> VmResult<Self> {
        Self::with_config(module, RuntimeConfig::default())
    }

    pub fn with_config(
        module: Module,
        config: RuntimeConfig,
    ) -> VmResult<Self> {
        let jumps = module
            .functions
            .iter()
            .map(|f| Jumps::build(&f.body))
            .collect::<VmResult<Vec<_>>>()?;
        let memory = LinearMemory::new(&module, config.max_memory_pages)?;
        debug!(
            "instantiated module: {} functions, {} pages, heap at {}",
            module.functions.len(),
            memory.pages(),
            module.heap_base
        );
        Ok(Self {
            module: Arc::new(module),
            jumps: Arc::new(jumps),
            host: Host::new(config.capture_output),
            config,
            status: VmStatus::Ready,
            memory,
            promises: PromiseRegistry::new(),
            scheduler: Scheduler::new()?,
            tasks: HashMap::new(),
            next_task: 1,
            root: None,
            root_result: None,
        })
    }

    pub fn status(&self) -> VmStatus {
        self.status
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn memory(&self) -> &LinearMemory {
        &self.memory
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut Host {
        &mut self.host
    }

    /// Provide the implementation of `extern fn name`
    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        function: F,
    ) where
        F: FnMut(&[Value]) -> Result<Option<Value>, String> + 'static,
    {
        self.host.register(name, function);
    }

    /// Contents of the string object at `ptr`
    pub fn read_string(
        &self,
        ptr: i32,
    ) -> VmResult<String> {
        let bytes = self.memory.read_str(ptr as u32)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Run the script body, then `main`
    pub fn run(&mut self) -> VmResult<Execution> {
        let result = self.run_entry();
        self.status = match result {
            Ok(_) => VmStatus::Finished,
            Err(_) => VmStatus::Failed,
        };
        result
    }

    fn run_entry(&mut self) -> VmResult<Execution> {
        self.link()?;
        self.status = VmStatus::Running;
        let module = Arc::clone(&self.module);
        if let Some(start) = module.start {
            info!("running script body");
            self.invoke(start, Vec::new())?;
        }
        let value = match &module.main {
            None => None,
            Some(entry) => {
                info!("running main");
                let value = self.invoke(entry.function, Vec::new())?;
                if entry.is_async {
                    let handle = promise_handle(value.ok_or(VmError::StackUnderflow)?)?;
                    let bits = self.settle(handle)?;
                    entry.result.map(|ty| Value::from_payload(bits, ty))
                } else {
                    value
                }
            }
        };
        Ok(Execution {
            value,
            output: self.host.take_output(),
        })
    }

    /// Call an exported function and run until it returns
    pub fn call(
        &mut self,
        name: &str,
        args: &[Value],
    ) -> VmResult<Option<Value>> {
        self.link()?;
        let index = self
            .module
            .export(name)
            .ok_or_else(|| VmError::UnknownExport(name.to_string()))?;
        self.invoke(index, args.to_vec())
    }

    /// Run tasks until `handle` settles; returns the resolved payload
    pub fn settle(
        &mut self,
        handle: PromiseHandle,
    ) -> VmResult<i64> {
        self.drive(|vm| {
            vm.promises
                .state(handle)
                .map(|s| s.is_settled())
                .unwrap_or(true)
        })?;
        match self.promises.state(handle)? {
            PromiseState::Resolved(value) => Ok(value),
            PromiseState::Rejected(_) => Err(VmError::Rejected(handle)),
            PromiseState::Pending => Err(VmError::Deadlock(self.tasks.len())),
        }
    }

    /// Every `extern fn` import must have a registered implementation
    fn link(&self) -> VmResult<()> {
        for import in self.module.imports.iter().skip(HOST_IMPORTS.len()) {
            if !self.host.has_extern(&import.name) {
                return Err(VmError::Link(import.name.clone()));
            }
        }
        Ok(())
    }

    fn invoke(
        &mut self,
        index: u32,
        args: Vec<Value>,
    ) -> VmResult<Option<Value>> {
        let id = self.spawn(index, args)?;
        self.root = Some(id);
        self.root_result = None;
        let result = self.drive(|vm| vm.root_result.is_some());
        self.root = None;
        result?;
        Ok(self.root_result.take().flatten())
    }

    fn spawn(
        &mut self,
        index: u32,
        args: Vec<Value>,
    ) -> VmResult<TaskId> {
        let id = TaskId(self.next_task);
        self.next_task += 1;
        let mut task = Task::new(id);
        task.stack = args;
        let module = Arc::clone(&self.module);
        self.enter(&module, &mut task, index)?;
        trace!("spawned {} at function {}", id, index);
        self.tasks.insert(id, task);
        self.scheduler.ready(id);
        Ok(id)
    }

    /// The event loop: run ready tasks, otherwise wait for host work
    fn drive(
        &mut self,
        done: impl Fn(&Self) -> bool,
    ) -> VmResult<()> {
        loop {
            if done(&*self) {
                return Ok(());
            }
            if let Some(id) = self.scheduler.next_ready() {
                let Some(mut task) = self.tasks.remove(&id) else {
                    continue;
                };
                match self.run_slice(&mut task)? {
                    Slice::Finished(value) => {
                        trace!("{} finished", id);
                        if self.root == Some(id) {
                            self.root_result = Some(value);
                        }
                    }
                    Slice::Blocked => {
                        self.tasks.insert(id, task);
                    }
                    Slice::Yielded => {
                        self.tasks.insert(id, task);
                        self.scheduler.ready(id);
                    }
                }
                continue;
            }
            match self.scheduler.wait() {
                Some(completion) => self.complete(completion)?,
                None => return Err(VmError::Deadlock(self.tasks.len())),
            }
        }
    }

    /// Settle the promise of finished host work
    fn complete(
        &mut self,
        completion: Completion,
    ) -> VmResult<()> {
        let payload = match completion.outcome {
            IoOutcome::Unit => 0,
            IoOutcome::Text(result) => {
                let result = match result {
                    Ok(bytes) => Ok(Value::I32(self.memory.alloc_str(&bytes)? as i32)),
                    Err(message) => Err(message),
                };
                self.result_object(result)? as i64
            }
            IoOutcome::Count(result) => self.result_object(result.map(Value::I32))? as i64,
        };
        trace!("{} resolved by host", completion.handle);
        let waiters = self.promises.resolve(completion.handle, payload)?;
        self.wake(waiters);
        Ok(())
    }

    /// Allocate a `Result` object `[tag][payload]`
    fn result_object(
        &mut self,
        result: Result<Value, String>,
    ) -> VmResult<u32> {
        let (tag, payload) = match result {
            Ok(value) => (TAG_OK, value),
            Err(message) => (
                TAG_ERR,
                Value::I32(self.memory.alloc_str(message.as_bytes())? as i32),
            ),
        };
        let object = self.memory.alloc(2 * WORD)?;
        self.memory
            .store(MemKind::I32, object as i32, 0, Value::I32(tag))?;
        self.memory.store(
            MemKind::of(payload.ty()),
            object as i32,
            PAYLOAD_OFFSET,
            payload,
        )?;
        Ok(object)
    }

    fn wake(
        &mut self,
        waiters: Vec<TaskId>,
    ) {
        for id in waiters {
            self.scheduler.ready(id);
        }
    }

    /// Push a frame for defined function `index`, taking its arguments
    /// from the task's operand stack
    fn enter(
        &self,
        module: &Module,
        task: &mut Task,
        index: u32,
    ) -> VmResult<()> {
        let function_index = (index as usize)
            .checked_sub(module.imports.len())
            .filter(|i| *i < module.functions.len())
            .ok_or(VmError::UnknownFunction(index))?;
        if task.frames.len() >= self.config.max_call_depth {
            return Err(VmError::StackOverflow(task.frames.len()));
        }
        let function = &module.functions[function_index];
        let split = task
            .stack
            .len()
            .checked_sub(function.ty.params.len())
            .ok_or(VmError::StackUnderflow)?;
        let mut locals = task.stack.split_off(split);
        locals.extend(function.locals.iter().map(|ty| Value::zero(*ty)));
        let base = task.stack.len();
        task.frames.push(Frame::new(function_index, locals, base));
        Ok(())
    }

    fn run_slice(
        &mut self,
        task: &mut Task,
    ) -> VmResult<Slice> {
        let module = Arc::clone(&self.module);
        let jumps = Arc::clone(&self.jumps);

        if let Some(handle) = task.awaiting.take() {
            match self.promises.state(handle)? {
                PromiseState::Resolved(value) => task.stack.push(Value::I64(value)),
                PromiseState::Rejected(_) => return Err(VmError::Rejected(handle)),
                PromiseState::Pending => {
                    task.awaiting = Some(handle);
                    return Ok(Slice::Blocked);
                }
            }
        }

        let mut fuel = self.config.fuel;
        loop {
            if let Some(left) = fuel.as_mut() {
                if *left == 0 {
                    trace!("{} out of fuel", task.id);
                    return Ok(Slice::Yielded);
                }
                *left -= 1;
            }

            let frame = task
                .frames
                .last_mut()
                .ok_or_else(|| VmError::Malformed("task has no frames".to_string()))?;
            let function = &module.functions[frame.function];
            let code = &jumps[frame.function];
            let pc = frame.pc;
            let instr = function
                .body
                .get(pc)
                .ok_or_else(|| VmError::Malformed(format!("{} runs past its end", function.name)))?;
            frame.pc += 1;
            let stack = &mut task.stack;

            match instr {
                Instr::Unreachable => return Err(VmError::trap(&function.name, "unreachable")),
                Instr::Block(ty) => frame.labels.push(Label {
                    kind: LabelKind::Block,
                    target: code.end(pc),
                    height: stack.len(),
                    arity: ty.is_some() as usize,
                }),
                Instr::Loop(_) => frame.labels.push(Label {
                    kind: LabelKind::Loop,
                    target: pc,
                    height: stack.len(),
                    arity: 0,
                }),
                Instr::If(ty) => {
                    let condition = pop(stack)?.as_i32()?;
                    frame.labels.push(Label {
                        kind: LabelKind::If,
                        target: code.end(pc),
                        height: stack.len(),
                        arity: ty.is_some() as usize,
                    });
                    if condition == 0 {
                        frame.pc = match code.else_(pc) {
                            Some(at) => at + 1,
                            None => code.end(pc),
                        };
                    }
                }
                Instr::Else => {
                    let label = frame
                        .labels
                        .last()
                        .ok_or_else(|| VmError::Malformed("else outside if".to_string()))?;
                    frame.pc = label.target;
                }
                Instr::End => {
                    if frame.labels.pop().is_none() {
                        if let Some(result) = leave(&module, task)? {
                            return Ok(Slice::Finished(result));
                        }
                    }
                }
                Instr::Br(depth) => branch(frame, stack, *depth)?,
                Instr::BrIf(depth) => {
                    if pop(stack)?.as_i32()? != 0 {
                        branch(frame, stack, *depth)?;
                    }
                }
                Instr::Return => {
                    if let Some(result) = leave(&module, task)? {
                        return Ok(Slice::Finished(result));
                    }
                }
                Instr::Call(index) => {
                    if let Some(handle) = self.call_index(&module, task, *index)? {
                        task.awaiting = Some(handle);
                        return Ok(Slice::Blocked);
                    }
                }
                Instr::CallIndirect(ty) => {
                    let slot = pop(stack)?.as_i32()?;
                    let index = usize::try_from(slot)
                        .ok()
                        .and_then(|s| module.table.get(s))
                        .copied()
                        .ok_or(VmError::TableOutOfBounds(slot))?;
                    let expected = module
                        .types
                        .get(*ty as usize)
                        .ok_or_else(|| VmError::Malformed(format!("unknown type index {}", ty)))?;
                    if module.func_type(index) != Some(expected) {
                        return Err(VmError::IndirectTypeMismatch(index));
                    }
                    self.enter(&module, task, index)?;
                }
                Instr::Drop => {
                    pop(stack)?;
                }
                Instr::LocalGet(i) => {
                    let value = *frame.locals.get(*i as usize).ok_or_else(|| bad_local(*i))?;
                    stack.push(value);
                }
                Instr::LocalSet(i) => {
                    let value = pop(stack)?;
                    *frame.locals.get_mut(*i as usize).ok_or_else(|| bad_local(*i))? = value;
                }
                Instr::LocalTee(i) => {
                    let value = *stack.last().ok_or(VmError::StackUnderflow)?;
                    *frame.locals.get_mut(*i as usize).ok_or_else(|| bad_local(*i))? = value;
                }
                Instr::I32Const(v) => stack.push(Value::I32(*v)),
                Instr::I64Const(v) => stack.push(Value::I64(*v)),
                Instr::F64Const(v) => stack.push(Value::F64(*v)),
                Instr::Load { kind, offset } => {
                    let addr = pop(stack)?.as_i32()?;
                    stack.push(self.memory.load(*kind, addr, *offset)?);
                }
                Instr::Store { kind, offset } => {
                    let value = pop(stack)?;
                    let addr = pop(stack)?.as_i32()?;
                    self.memory.store(*kind, addr, *offset, value)?;
                }
                Instr::MemoryCopy => {
                    let len = pop(stack)?.as_i32()?;
                    let src = pop(stack)?.as_i32()?;
                    let dst = pop(stack)?.as_i32()?;
                    self.memory.copy(dst, src, len)?;
                }
                Instr::Num(op) => numeric(*op, stack, &function.name)?,
            }
        }
    }

    /// Call import or function `index`. Returns the promise to park on
    /// when the call suspends the task.
    fn call_index(
        &mut self,
        module: &Module,
        task: &mut Task,
        index: u32,
    ) -> VmResult<Option<PromiseHandle>> {
        let Some(import) = module.imports.get(index as usize) else {
            self.enter(module, task, index)?;
            return Ok(None);
        };
        let split = task
            .stack
            .len()
            .checked_sub(import.ty.params.len())
            .ok_or(VmError::StackUnderflow)?;
        let args = task.stack.split_off(split);
        let result = match HostImport::from_index(index) {
            Some(op) => match self.host_import(op, task.id, &args)? {
                HostCall::Return(value) => value,
                HostCall::Suspend(handle) => {
                    trace!("{} parks on {}", task.id, handle);
                    return Ok(Some(handle));
                }
            },
            None => self.host.call_extern(&import.name, &args)?,
        };
        match (result, import.ty.results.first()) {
            (Some(value), Some(ty)) if value.ty() == *ty => task.stack.push(value),
            (None, None) => {}
            _ => {
                return Err(VmError::Host {
                    name: import.name.clone(),
                    message: "returned a value of the wrong type".to_string(),
                })
            }
        }
        Ok(None)
    }

    fn host_import(
        &mut self,
        op: HostImport,
        task: TaskId,
        args: &[Value],
    ) -> VmResult<HostCall> {
        let arg = |i: usize| args.get(i).copied().ok_or(VmError::StackUnderflow);
        let value = match op {
            HostImport::Log => {
                let line = self.string_arg(arg(0)?, arg(1)?)?;
                self.host.log(line);
                None
            }
            HostImport::Alloc => {
                let size = arg(0)?.as_i32()? as u32;
                Some(Value::I32(self.memory.alloc(size)? as i32))
            }
            HostImport::HttpGet => {
                let url = self.string_arg(arg(0)?, arg(1)?)?;
                Some(self.submit(IoRequest::HttpGet { url }))
            }
            HostImport::HttpPost => {
                let url = self.string_arg(arg(0)?, arg(1)?)?;
                let body = self.bytes_arg(arg(2)?, arg(3)?)?;
                Some(self.submit(IoRequest::HttpPost { url, body }))
            }
            HostImport::FileRead => {
                let path = self.string_arg(arg(0)?, arg(1)?)?;
                Some(self.submit(IoRequest::ReadFile { path }))
            }
            HostImport::FileWrite => {
                let path = self.string_arg(arg(0)?, arg(1)?)?;
                let data = self.bytes_arg(arg(2)?, arg(3)?)?;
                Some(self.submit(IoRequest::WriteFile { path, data }))
            }
            HostImport::TimerSchedule => {
                let ms = arg(0)?.as_i32()?.max(0) as u64;
                let deadline = Instant::now() + Duration::from_millis(ms);
                Some(self.submit(IoRequest::Sleep(deadline)))
            }
            HostImport::TaskSpawn => {
                let slot = arg(0)?.as_i32()?;
                let index = usize::try_from(slot)
                    .ok()
                    .and_then(|s| self.module.table.get(s))
                    .copied()
                    .ok_or(VmError::TableOutOfBounds(slot))?;
                let handle = self.promises.create();
                let id = self.spawn(index, vec![Value::I32(handle.0 as i32), arg(1)?])?;
                debug!("{} spawned {} for {}", task, id, handle);
                Some(Value::I32(handle.0 as i32))
            }
            HostImport::PromiseResolve => {
                let handle = promise_handle(arg(0)?)?;
                let waiters = self.promises.resolve(handle, arg(1)?.as_i64()?)?;
                self.wake(waiters);
                None
            }
            HostImport::PromiseReject => {
                let handle = promise_handle(arg(0)?)?;
                let waiters = self.promises.reject(handle, arg(1)?.as_i64()?)?;
                self.wake(waiters);
                None
            }
            HostImport::PromiseAwait => {
                let handle = promise_handle(arg(0)?)?;
                match self.promises.wait(handle, task)? {
                    Some(PromiseState::Resolved(value)) => Some(Value::I64(value)),
                    Some(PromiseState::Rejected(_)) => return Err(VmError::Rejected(handle)),
                    Some(PromiseState::Pending) | None => return Ok(HostCall::Suspend(handle)),
                }
            }
            HostImport::FmtI64 => Some(self.string_value(&arg(0)?.as_i64()?.to_string())?),
            HostImport::FmtU64 => Some(self.string_value(&(arg(0)?.as_i64()? as u64).to_string())?),
            HostImport::FmtF64 => Some(self.string_value(&arg(0)?.as_f64()?.to_string())?),
        };
        Ok(HostCall::Return(value))
    }

    fn submit(
        &mut self,
        request: IoRequest,
    ) -> Value {
        let handle = self.promises.create();
        self.scheduler.submit(handle, request);
        Value::I32(handle.0 as i32)
    }

    fn bytes_arg(
        &self,
        ptr: Value,
        len: Value,
    ) -> VmResult<Vec<u8>> {
        Ok(self
            .memory
            .read(ptr.as_i32()? as u32, len.as_i32()? as u32)?
            .to_vec())
    }

    fn string_arg(
        &self,
        ptr: Value,
        len: Value,
    ) -> VmResult<String> {
        let bytes = self.bytes_arg(ptr, len)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn string_value(
        &mut self,
        text: &str,
    ) -> VmResult<Value> {
        Ok(Value::I32(self.memory.alloc_str(text.as_bytes())? as i32))
    }
}

fn promise_handle(value: Value) -> VmResult<PromiseHandle> {
    Ok(PromiseHandle(value.as_i32()? as u32))
}

fn bad_local(index: u32) -> VmError {
    VmError::Malformed(format!("local {} out of range", index))
}

fn pop(stack: &mut Vec<Value>) -> VmResult<Value> {
    stack.pop().ok_or(VmError::StackUnderflow)
}

/// Pop the current frame. Returns the task's result when it was the last.
fn leave(
    module: &Module,
    task: &mut Task,
) -> VmResult<Option<Option<Value>>> {
    let frame = task
        .frames
        .pop()
        .ok_or_else(|| VmError::Malformed("return without a frame".to_string()))?;
    let arity = module.functions[frame.function].ty.results.len();
    let split = task
        .stack
        .len()
        .checked_sub(arity)
        .filter(|split| *split >= frame.base)
        .ok_or(VmError::StackUnderflow)?;
    let results = task.stack.split_off(split);
    task.stack.truncate(frame.base);
    if task.frames.is_empty() {
        return Ok(Some(results.into_iter().next()));
    }
    task.stack.extend(results);
    Ok(None)
}

fn branch(
    frame: &mut Frame,
    stack: &mut Vec<Value>,
    depth: u32,
) -> VmResult<()> {
    let index = frame
        .labels
        .len()
        .checked_sub(depth as usize + 1)
        .ok_or_else(|| VmError::Malformed(format!("branch depth {} out of range", depth)))?;
    let label = frame.labels[index];
    match label.kind {
        LabelKind::Loop => {
            stack.truncate(label.height);
            frame.labels.truncate(index + 1);
        }
        LabelKind::Block | LabelKind::If => {
            let split = stack
                .len()
                .checked_sub(label.arity)
                .ok_or(VmError::StackUnderflow)?;
            let carried = stack.split_off(split);
            stack.truncate(label.height);
            stack.extend(carried);
            frame.labels.truncate(index);
        }
    }
    frame.pc = label.target + 1;
    Ok(())
}

fn numeric(
    op: NumOp,
    stack: &mut Vec<Value>,
    function: &str,
) -> VmResult<()> {
    use NumOp::*;
    let trap = |reason: &str| VmError::trap(function, reason);
    let value = match op {
        I32Eqz => Value::I32((pop(stack)?.as_i32()? == 0) as i32),
        I64Eqz => Value::I32((pop(stack)?.as_i64()? == 0) as i32),
        F64Neg => Value::F64(-pop(stack)?.as_f64()?),
        I32WrapI64 => Value::I32(pop(stack)?.as_i64()? as i32),
        I64ExtendI32S => Value::I64(pop(stack)?.as_i32()? as i64),
        I64ExtendI32U => Value::I64(pop(stack)?.as_i32()? as u32 as i64),
        F64ConvertI32S => Value::F64(pop(stack)?.as_i32()? as f64),
        F64ConvertI32U => Value::F64(pop(stack)?.as_i32()? as u32 as f64),
        F64ConvertI64S => Value::F64(pop(stack)?.as_i64()? as f64),
        F64ConvertI64U => Value::F64(pop(stack)?.as_i64()? as u64 as f64),
        // `as` from float saturates and maps NaN to zero
        I32TruncSatF64S => Value::I32(pop(stack)?.as_f64()? as i32),
        I32TruncSatF64U => Value::I32(pop(stack)?.as_f64()? as u32 as i32),
        I64TruncSatF64S => Value::I64(pop(stack)?.as_f64()? as i64),
        I64TruncSatF64U => Value::I64(pop(stack)?.as_f64()? as u64 as i64),
        I64ReinterpretF64 => Value::I64(pop(stack)?.as_f64()?.to_bits() as i64),
        F64ReinterpretI64 => Value::F64(f64::from_bits(pop(stack)?.as_i64()? as u64)),

        I32Eq | I32Ne | I32LtS | I32LtU | I32GtS | I32GtU | I32LeS | I32LeU | I32GeS | I32GeU
        | I32Add | I32Sub | I32Mul | I32DivS | I32DivU | I32RemS | I32RemU | I32And | I32Or
        | I32Shl | I32ShrS | I32ShrU => {
            let b = pop(stack)?.as_i32()?;
            let a = pop(stack)?.as_i32()?;
            let (ua, ub) = (a as u32, b as u32);
            match op {
                I32Eq => Value::I32((a == b) as i32),
                I32Ne => Value::I32((a != b) as i32),
                I32LtS => Value::I32((a < b) as i32),
                I32LtU => Value::I32((ua < ub) as i32),
                I32GtS => Value::I32((a > b) as i32),
                I32GtU => Value::I32((ua > ub) as i32),
                I32LeS => Value::I32((a <= b) as i32),
                I32LeU => Value::I32((ua <= ub) as i32),
                I32GeS => Value::I32((a >= b) as i32),
                I32GeU => Value::I32((ua >= ub) as i32),
                I32Add => Value::I32(a.wrapping_add(b)),
                I32Sub => Value::I32(a.wrapping_sub(b)),
                I32Mul => Value::I32(a.wrapping_mul(b)),
                I32DivS if b == 0 => return Err(trap("integer divide by zero")),
                I32DivS => Value::I32(a.checked_div(b).ok_or_else(|| trap("integer overflow"))?),
                I32DivU => Value::I32(
                    ua.checked_div(ub)
                        .ok_or_else(|| trap("integer divide by zero"))? as i32,
                ),
                I32RemS if b == 0 => return Err(trap("integer divide by zero")),
                I32RemS => Value::I32(a.wrapping_rem(b)),
                I32RemU => Value::I32(
                    ua.checked_rem(ub)
                        .ok_or_else(|| trap("integer divide by zero"))? as i32,
                ),
                I32And => Value::I32(a & b),
                I32Or => Value::I32(a | b),
                I32Shl => Value::I32(a.wrapping_shl(ub)),
                I32ShrS => Value::I32(a.wrapping_shr(ub)),
                _ => Value::I32(ua.wrapping_shr(ub) as i32),
            }
        }

        I64Eq | I64Ne | I64LtS | I64LtU | I64GtS | I64GtU | I64LeS | I64LeU | I64GeS | I64GeU
        | I64Add | I64Sub | I64Mul | I64DivS | I64DivU | I64RemS | I64RemU => {
            let b = pop(stack)?.as_i64()?;
            let a = pop(stack)?.as_i64()?;
            let (ua, ub) = (a as u64, b as u64);
            match op {
                I64Eq => Value::I32((a == b) as i32),
                I64Ne => Value::I32((a != b) as i32),
                I64LtS => Value::I32((a < b) as i32),
                I64LtU => Value::I32((ua < ub) as i32),
                I64GtS => Value::I32((a > b) as i32),
                I64GtU => Value::I32((ua > ub) as i32),
                I64LeS => Value::I32((a <= b) as i32),
                I64LeU => Value::I32((ua <= ub) as i32),
                I64GeS => Value::I32((a >= b) as i32),
                I64GeU => Value::I32((ua >= ub) as i32),
                I64Add => Value::I64(a.wrapping_add(b)),
                I64Sub => Value::I64(a.wrapping_sub(b)),
                I64Mul => Value::I64(a.wrapping_mul(b)),
                I64DivS if b == 0 => return Err(trap("integer divide by zero")),
                I64DivS => Value::I64(a.checked_div(b).ok_or_else(|| trap("integer overflow"))?),
                I64DivU => Value::I64(
                    ua.checked_div(ub)
                        .ok_or_else(|| trap("integer divide by zero"))? as i64,
                ),
                I64RemS if b == 0 => return Err(trap("integer divide by zero")),
                I64RemS => Value::I64(a.wrapping_rem(b)),
                _ => Value::I64(
                    ua.checked_rem(ub)
                        .ok_or_else(|| trap("integer divide by zero"))? as i64,
                ),
            }
        }

        F64Eq | F64Ne | F64Lt | F64Gt | F64Le | F64Ge | F64Add | F64Sub | F64Mul | F64Div => {
            let b = pop(stack)?.as_f64()?;
            let a = pop(stack)?.as_f64()?;
            match op {
                F64Eq => Value::I32((a == b) as i32),
                F64Ne => Value::I32((a != b) as i32),
                F64Lt => Value::I32((a < b) as i32),
                F64Gt => Value::I32((a > b) as i32),
                F64Le => Value::I32((a <= b) as i32),
                F64Ge => Value::I32((a >= b) as i32),
                F64Add => Value::F64(a + b),
                F64Sub => Value::F64(a - b),
                F64Mul => Value::F64(a * b),
                _ => Value::F64(a / b),
            }
        }
    };
    stack.push(value);
    Ok(())
}
